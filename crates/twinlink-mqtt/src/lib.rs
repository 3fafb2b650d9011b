//! # Twinlink MQTT
//!
//! Topic-mapping and dispatch engine bridging MQTT topics to the typed
//! digital-asset event model of `twinlink-core`.
//!
//! ## Components
//!
//! - [`TopicDescriptor`]: topic string plus QoS/retained delivery policy
//! - [`IncomingMapping`] / [`OutgoingMapping`]: translation functions between
//!   raw payloads and typed domain events
//! - [`AdapterConfiguration`] + [`ConfigurationBuilder`]: the validated,
//!   immutable mapping registry
//! - [`MqttDispatcher`]: lifecycle owner driving subscription, translation,
//!   and publication over a single broker connection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod incoming;
pub mod outgoing;
pub mod sink;
pub mod topic;

pub use config::{AdapterConfiguration, ConfigurationBuilder, ConfigurationError, Credentials};
pub use dispatcher::{DispatcherError, LifecycleState, MqttDispatcher};
pub use incoming::IncomingMapping;
pub use outgoing::OutgoingMapping;
pub use sink::{ChannelSink, SinkMessage};
pub use topic::{QosLevel, TopicDescriptor, TranslationError};
