//! Typed domain events exchanged with the runtime.
//!
//! Inbound, the adapter produces [`DomainEvent`] values from raw topic
//! payloads. Outbound, the runtime submits [`ActionRequest`] values that the
//! adapter turns back into payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A new value observed for a declared property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    /// Key of the property being updated
    pub key: String,
    /// The observed value
    pub value: Value,
}

impl PropertyUpdate {
    /// Create a new property update.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A notification for a declared event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNotification {
    /// Key of the event being notified
    pub key: String,
    /// Event body
    pub body: Value,
}

impl EventNotification {
    /// Create a new event notification.
    #[must_use]
    pub fn new(key: impl Into<String>, body: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
        }
    }
}

/// A typed event flowing from the wire to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A property changed value
    PropertyUpdate(PropertyUpdate),
    /// An event fired
    EventNotification(EventNotification),
}

impl DomainEvent {
    /// Shorthand for a property-update event.
    #[must_use]
    pub fn property(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::PropertyUpdate(PropertyUpdate::new(key, value))
    }

    /// Shorthand for an event notification.
    #[must_use]
    pub fn event(key: impl Into<String>, body: impl Into<Value>) -> Self {
        Self::EventNotification(EventNotification::new(key, body))
    }

    /// The property or event key this event refers to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::PropertyUpdate(update) => &update.key,
            Self::EventNotification(notification) => &notification.key,
        }
    }
}

/// A runtime-initiated action destined for the physical side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Key of the declared action
    pub key: String,
    /// Action body, opaque to the adapter
    pub body: Value,
}

impl ActionRequest {
    /// Create a new action request.
    #[must_use]
    pub fn new(key: impl Into<String>, body: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
        }
    }
}
