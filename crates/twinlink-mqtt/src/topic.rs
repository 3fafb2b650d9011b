//! Topic descriptors and the shared failure surface of translation functions.

use crate::config::ConfigurationError;
use serde::{Deserialize, Serialize};

/// MQTT quality-of-service level for a topic interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QosLevel {
    /// QoS 0, fire and forget
    #[default]
    AtMostOnce,
    /// QoS 1, acknowledged delivery
    AtLeastOnce,
    /// QoS 2, assured single delivery
    ExactlyOnce,
}

impl QosLevel {
    /// Numeric wire value (0, 1, or 2).
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

impl From<QosLevel> for rumqttc::QoS {
    fn from(level: QosLevel) -> Self {
        match level {
            QosLevel::AtMostOnce => Self::AtMostOnce,
            QosLevel::AtLeastOnce => Self::AtLeastOnce,
            QosLevel::ExactlyOnce => Self::ExactlyOnce,
        }
    }
}

/// Identity and delivery policy of a single topic interaction.
///
/// The topic string is an opaque broker-layer identifier, compared only for
/// equality. No wildcard semantics are interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescriptor {
    topic: String,
    qos: QosLevel,
    retained: bool,
}

impl TopicDescriptor {
    /// Create a descriptor for the given topic, with QoS 0 and retained off.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyTopic`] if the topic is empty.
    pub fn new(topic: impl Into<String>) -> Result<Self, ConfigurationError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(ConfigurationError::EmptyTopic);
        }
        Ok(Self {
            topic,
            qos: QosLevel::default(),
            retained: false,
        })
    }

    /// Set the QoS level.
    #[must_use]
    pub fn with_qos(mut self, qos: QosLevel) -> Self {
        self.qos = qos;
        self
    }

    /// Set the retained delivery flag.
    #[must_use]
    pub fn with_retained(mut self, retained: bool) -> Self {
        self.retained = retained;
        self
    }

    /// The topic string.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The QoS level.
    #[must_use]
    pub fn qos(&self) -> QosLevel {
        self.qos
    }

    /// The retained delivery flag.
    #[must_use]
    pub fn retained(&self) -> bool {
        self.retained
    }
}

/// Failure inside a caller-supplied translation function.
///
/// Inbound, a translation error causes the triggering message to be dropped
/// and logged; it never takes down the dispatcher. Outbound, it is returned
/// to the caller and the action is considered undelivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TranslationError(pub String);

impl TranslationError {
    /// Create a translation error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
