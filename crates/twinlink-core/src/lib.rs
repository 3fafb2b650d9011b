//! # Twinlink Core
//!
//! Transport-independent data model for bridging a physical asset to a
//! digital-twin runtime.
//!
//! This crate provides:
//! - The declared asset surface: properties, events, actions
//! - Typed domain events flowing from the wire to the runtime
//! - The [`TwinSink`] contract implemented by the consuming runtime

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asset;
pub mod event;
pub mod sink;

pub use asset::{AssetAction, AssetDescription, AssetEvent, AssetProperty};
pub use event::{ActionRequest, DomainEvent, EventNotification, PropertyUpdate};
pub use sink::TwinSink;
