//! Declared asset surface: properties, events, and actions.
//!
//! The description is assembled once at configuration time and announced to
//! the runtime as a single snapshot when the adapter starts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declared property of the asset, with its initial value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetProperty {
    /// Property key, unique within the asset by convention (not enforced)
    pub key: String,
    /// Value reported before the first update arrives from the wire
    pub initial_value: Value,
}

impl AssetProperty {
    /// Create a new property declaration.
    #[must_use]
    pub fn new(key: impl Into<String>, initial_value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            initial_value: initial_value.into(),
        }
    }
}

/// A declared event of the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEvent {
    /// Event key, unique within the asset by convention (not enforced)
    pub key: String,
    /// Event type descriptor (e.g., a MIME type or semantic id)
    pub event_type: String,
}

impl AssetEvent {
    /// Create a new event declaration.
    #[must_use]
    pub fn new(key: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            event_type: event_type.into(),
        }
    }
}

/// A declared action the runtime may invoke on the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAction {
    /// Action key; enforced unique only among keys bound to outgoing mappings
    pub key: String,
    /// Action type descriptor (e.g., "sensor.actuation")
    pub action_type: String,
    /// Content type of the action body (e.g., "text/plain")
    pub content_type: String,
}

impl AssetAction {
    /// Create a new action declaration.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            action_type: action_type.into(),
            content_type: content_type.into(),
        }
    }
}

/// The complete declared surface of the asset.
///
/// Pushed to the runtime sink exactly once, on successful adapter start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetDescription {
    /// Declared properties
    pub properties: Vec<AssetProperty>,
    /// Declared events
    pub events: Vec<AssetEvent>,
    /// Declared actions
    pub actions: Vec<AssetAction>,
}

impl AssetDescription {
    /// Create a description from its parts.
    #[must_use]
    pub fn new(
        properties: Vec<AssetProperty>,
        events: Vec<AssetEvent>,
        actions: Vec<AssetAction>,
    ) -> Self {
        Self {
            properties,
            events,
            actions,
        }
    }

    /// Whether no property, event, or action is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.events.is_empty() && self.actions.is_empty()
    }

    /// Whether a property with the given key is declared.
    #[must_use]
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.iter().any(|p| p.key == key)
    }

    /// Whether an event with the given key is declared.
    #[must_use]
    pub fn has_event(&self, key: &str) -> bool {
        self.events.iter().any(|e| e.key == key)
    }

    /// Whether an action with the given key is declared.
    #[must_use]
    pub fn has_action(&self, key: &str) -> bool {
        self.actions.iter().any(|a| a.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_description() {
        let description = AssetDescription::default();
        assert!(description.is_empty());
        assert!(!description.has_property("temperature"));
    }

    #[test]
    fn key_lookups() {
        let description = AssetDescription::new(
            vec![AssetProperty::new("temperature", json!(0.0))],
            vec![AssetEvent::new("overheating", "text/plain")],
            vec![AssetAction::new("switch-off", "sensor.actuation", "text/plain")],
        );

        assert!(!description.is_empty());
        assert!(description.has_property("temperature"));
        assert!(description.has_event("overheating"));
        assert!(description.has_action("switch-off"));
        assert!(!description.has_action("overheating"));
    }
}
