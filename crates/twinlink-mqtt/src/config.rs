//! Validated adapter configuration and its builder.
//!
//! The builder is the only place invariants are enforced: duplicate
//! registrations are rejected eagerly at the registering call, while the
//! holistic "at least one declaration" and "at least one mapping" checks run
//! once at [`ConfigurationBuilder::build`]. The resulting
//! [`AdapterConfiguration`] is immutable and shared read-only with the
//! dispatcher for the life of the adapter.

use crate::incoming::IncomingMapping;
use crate::outgoing::OutgoingMapping;
use crate::topic::{TopicDescriptor, TranslationError};
use rumqttc::MqttOptions;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use twinlink_core::{AssetAction, AssetDescription, AssetEvent, AssetProperty};
use uuid::Uuid;

/// Default broker connection timeout.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the in-memory request queue feeding the connection.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Keep-alive interval for the broker connection.
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Username/password pair for broker authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Broker username
    pub username: String,
    /// Broker password
    pub password: String,
}

/// The validated, immutable mapping registry and connection parameters.
///
/// Created only through [`AdapterConfiguration::builder`]; read-only once
/// built.
#[derive(Debug, Clone)]
pub struct AdapterConfiguration {
    broker_host: String,
    broker_port: u16,
    client_id: String,
    credentials: Option<Credentials>,
    connection_timeout: Duration,
    clean_session: bool,
    automatic_reconnect: bool,
    queue_capacity: usize,
    incoming: Vec<IncomingMapping>,
    incoming_index: HashMap<String, usize>,
    outgoing: HashMap<String, OutgoingMapping>,
    asset: AssetDescription,
}

impl AdapterConfiguration {
    /// Start building a configuration for the given broker.
    ///
    /// # Errors
    ///
    /// Fails if the broker host is empty or the port is zero.
    pub fn builder(
        broker_host: impl Into<String>,
        broker_port: u16,
    ) -> Result<ConfigurationBuilder, ConfigurationError> {
        let broker_host = broker_host.into();
        if broker_host.is_empty() {
            return Err(ConfigurationError::EmptyBrokerHost);
        }
        if broker_port == 0 {
            return Err(ConfigurationError::InvalidBrokerPort);
        }
        Ok(ConfigurationBuilder {
            broker_host,
            broker_port,
            client_id: None,
            credentials: None,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            clean_session: true,
            automatic_reconnect: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            actions: Vec::new(),
        })
    }

    /// The broker host.
    #[must_use]
    pub fn broker_host(&self) -> &str {
        &self.broker_host
    }

    /// The broker port.
    #[must_use]
    pub fn broker_port(&self) -> u16 {
        self.broker_port
    }

    /// The broker connection string, for logs and diagnostics.
    #[must_use]
    pub fn broker_url(&self) -> String {
        format!("tcp://{}:{}", self.broker_host, self.broker_port)
    }

    /// The MQTT client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The broker connection timeout.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Whether the connection is re-established automatically after the
    /// initial handshake.
    #[must_use]
    pub fn automatic_reconnect(&self) -> bool {
        self.automatic_reconnect
    }

    /// Capacity of the in-memory request queue.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// The ordered incoming mappings, in registration order.
    #[must_use]
    pub fn incoming_mappings(&self) -> &[IncomingMapping] {
        &self.incoming
    }

    /// Look up the incoming mapping subscribed to the given topic.
    #[must_use]
    pub fn incoming_for_topic(&self, topic: &str) -> Option<&IncomingMapping> {
        self.incoming_index.get(topic).map(|&i| &self.incoming[i])
    }

    /// Look up the outgoing mapping bound to the given action key.
    #[must_use]
    pub fn outgoing_for_action(&self, action_key: &str) -> Option<&OutgoingMapping> {
        self.outgoing.get(action_key)
    }

    /// The outgoing mappings, keyed by action key.
    #[must_use]
    pub fn outgoing_mappings(&self) -> &HashMap<String, OutgoingMapping> {
        &self.outgoing
    }

    /// The declared asset surface.
    #[must_use]
    pub fn asset_description(&self) -> &AssetDescription {
        &self.asset
    }

    /// Connection options for the underlying MQTT client.
    pub(crate) fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.client_id.clone(),
            self.broker_host.clone(),
            self.broker_port,
        );
        options.set_clean_session(self.clean_session);
        options.set_keep_alive(KEEP_ALIVE);
        if let Some(credentials) = &self.credentials {
            options.set_credentials(credentials.username.clone(), credentials.password.clone());
        }
        options
    }
}

/// Fluent, validating builder for [`AdapterConfiguration`].
///
/// Every fallible step consumes the builder and returns
/// `Result<Self, ConfigurationError>`, so registrations chain with `?`.
#[derive(Debug)]
pub struct ConfigurationBuilder {
    broker_host: String,
    broker_port: u16,
    client_id: Option<String>,
    credentials: Option<Credentials>,
    connection_timeout: Duration,
    clean_session: bool,
    automatic_reconnect: bool,
    queue_capacity: usize,
    incoming: Vec<IncomingMapping>,
    outgoing: Vec<(String, OutgoingMapping)>,
    properties: Vec<AssetProperty>,
    events: Vec<AssetEvent>,
    actions: Vec<AssetAction>,
}

impl ConfigurationBuilder {
    /// Register a property declaration together with the incoming mapping
    /// that produces its updates.
    ///
    /// # Errors
    ///
    /// Fails if the topic is already registered among incoming mappings.
    pub fn add_property_topic(
        mut self,
        key: impl Into<String>,
        initial_value: impl Into<Value>,
        descriptor: TopicDescriptor,
        parse: impl Fn(&str) -> Result<Value, TranslationError> + Send + Sync + 'static,
    ) -> Result<Self, ConfigurationError> {
        self.check_incoming_topic(descriptor.topic())?;
        let key = key.into();
        self.properties.push(AssetProperty::new(&key, initial_value));
        self.incoming.push(IncomingMapping::property(key, descriptor, parse));
        Ok(self)
    }

    /// Register an event declaration together with the incoming mapping that
    /// produces its notifications.
    ///
    /// # Errors
    ///
    /// Fails if the topic is already registered among incoming mappings.
    pub fn add_event_topic(
        mut self,
        key: impl Into<String>,
        event_type: impl Into<String>,
        descriptor: TopicDescriptor,
        parse: impl Fn(&str) -> Result<Value, TranslationError> + Send + Sync + 'static,
    ) -> Result<Self, ConfigurationError> {
        self.check_incoming_topic(descriptor.topic())?;
        let key = key.into();
        self.events.push(AssetEvent::new(&key, event_type));
        self.incoming.push(IncomingMapping::event(key, descriptor, parse));
        Ok(self)
    }

    /// Register an action declaration together with the outgoing mapping that
    /// publishes it, with the translation applied to the action body.
    ///
    /// # Errors
    ///
    /// Fails on an empty or duplicate action key, or a duplicate outgoing
    /// topic.
    pub fn add_action_topic(
        self,
        key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
        descriptor: TopicDescriptor,
        encode: impl Fn(&Value) -> Result<String, TranslationError> + Send + Sync + 'static,
    ) -> Result<Self, ConfigurationError> {
        let mapping = OutgoingMapping::from_body(descriptor, encode);
        self.add_outgoing_mapping(key, action_type, content_type, mapping)
    }

    /// Register a general incoming mapping together with the property and
    /// event declarations it is responsible for producing.
    ///
    /// # Errors
    ///
    /// Fails if both declaration lists are empty, or the topic is a
    /// duplicate.
    pub fn add_incoming_mapping(
        mut self,
        mapping: IncomingMapping,
        related_properties: Vec<AssetProperty>,
        related_events: Vec<AssetEvent>,
    ) -> Result<Self, ConfigurationError> {
        if related_properties.is_empty() && related_events.is_empty() {
            return Err(ConfigurationError::MissingRelatedDeclarations(
                mapping.topic().to_string(),
            ));
        }
        self.check_incoming_topic(mapping.topic())?;
        self.properties.extend(related_properties);
        self.events.extend(related_events);
        self.incoming.push(mapping);
        Ok(self)
    }

    /// Register a general outgoing mapping under an action key, declaring
    /// the action alongside.
    ///
    /// # Errors
    ///
    /// Fails on an empty or duplicate action key, or a duplicate outgoing
    /// topic.
    pub fn add_outgoing_mapping(
        mut self,
        key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
        mapping: OutgoingMapping,
    ) -> Result<Self, ConfigurationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigurationError::EmptyActionKey);
        }
        if self.outgoing.iter().any(|(k, _)| *k == key) {
            return Err(ConfigurationError::DuplicateActionKey(key));
        }
        if self.outgoing.iter().any(|(_, m)| m.topic() == mapping.topic()) {
            return Err(ConfigurationError::DuplicateOutgoingTopic(
                mapping.topic().to_string(),
            ));
        }
        self.actions
            .push(AssetAction::new(&key, action_type, content_type));
        self.outgoing.push((key, mapping));
        Ok(self)
    }

    /// Declare a property without a wire mapping of its own (e.g., one
    /// produced by a general incoming mapping registered separately).
    #[must_use]
    pub fn declare_property(mut self, key: impl Into<String>, initial_value: impl Into<Value>) -> Self {
        self.properties.push(AssetProperty::new(key, initial_value));
        self
    }

    /// Declare an event without a wire mapping of its own.
    #[must_use]
    pub fn declare_event(mut self, key: impl Into<String>, event_type: impl Into<String>) -> Self {
        self.events.push(AssetEvent::new(key, event_type));
        self
    }

    /// Declare an action without an outgoing mapping. Invoking such an
    /// action at runtime is a silent no-op.
    #[must_use]
    pub fn declare_action(
        mut self,
        key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.actions
            .push(AssetAction::new(key, action_type, content_type));
        self
    }

    /// Set the MQTT client id. Defaults to a generated `twinlink-{uuid}`.
    ///
    /// # Errors
    ///
    /// Fails if the id is empty.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Result<Self, ConfigurationError> {
        let client_id = client_id.into();
        if client_id.is_empty() {
            return Err(ConfigurationError::EmptyClientId);
        }
        self.client_id = Some(client_id);
        Ok(self)
    }

    /// Set broker credentials.
    ///
    /// # Errors
    ///
    /// Fails unless both username and password are non-empty.
    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(ConfigurationError::IncompleteCredentials);
        }
        self.credentials = Some(Credentials { username, password });
        Ok(self)
    }

    /// Set the broker connection timeout. Defaults to 10 seconds.
    ///
    /// # Errors
    ///
    /// Fails if the timeout is zero.
    pub fn connection_timeout(mut self, timeout: Duration) -> Result<Self, ConfigurationError> {
        if timeout.is_zero() {
            return Err(ConfigurationError::ZeroConnectionTimeout);
        }
        self.connection_timeout = timeout;
        Ok(self)
    }

    /// Set the clean-session flag. Defaults to true.
    #[must_use]
    pub fn clean_session(mut self, clean_session: bool) -> Self {
        self.clean_session = clean_session;
        self
    }

    /// Set the automatic-reconnect flag. Defaults to true.
    #[must_use]
    pub fn automatic_reconnect(mut self, automatic_reconnect: bool) -> Self {
        self.automatic_reconnect = automatic_reconnect;
        self
    }

    /// Set the capacity of the in-memory request queue feeding the
    /// connection. Defaults to 100.
    ///
    /// # Errors
    ///
    /// Fails if the capacity is zero.
    pub fn queue_capacity(mut self, capacity: usize) -> Result<Self, ConfigurationError> {
        if capacity == 0 {
            return Err(ConfigurationError::ZeroQueueCapacity);
        }
        self.queue_capacity = capacity;
        Ok(self)
    }

    /// Perform the holistic invariant checks and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Fails if no property, event, or action is declared, or no incoming or
    /// outgoing mapping is registered.
    pub fn build(self) -> Result<AdapterConfiguration, ConfigurationError> {
        if self.properties.is_empty() && self.events.is_empty() && self.actions.is_empty() {
            return Err(ConfigurationError::NoDeclarations);
        }
        if self.incoming.is_empty() && self.outgoing.is_empty() {
            return Err(ConfigurationError::NoMappings);
        }

        let client_id = self
            .client_id
            .unwrap_or_else(|| format!("twinlink-{}", Uuid::new_v4().simple()));

        let incoming_index = self
            .incoming
            .iter()
            .enumerate()
            .map(|(i, m)| (m.topic().to_string(), i))
            .collect();

        Ok(AdapterConfiguration {
            broker_host: self.broker_host,
            broker_port: self.broker_port,
            client_id,
            credentials: self.credentials,
            connection_timeout: self.connection_timeout,
            clean_session: self.clean_session,
            automatic_reconnect: self.automatic_reconnect,
            queue_capacity: self.queue_capacity,
            incoming: self.incoming,
            incoming_index,
            outgoing: self.outgoing.into_iter().collect(),
            asset: AssetDescription::new(self.properties, self.events, self.actions),
        })
    }

    fn check_incoming_topic(&self, topic: &str) -> Result<(), ConfigurationError> {
        if self.incoming.iter().any(|m| m.topic() == topic) {
            return Err(ConfigurationError::DuplicateIncomingTopic(topic.to_string()));
        }
        Ok(())
    }
}

/// A violated configuration invariant.
///
/// Raised synchronously by the builder; never once a configuration exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Broker host is empty
    #[error("broker host cannot be empty")]
    EmptyBrokerHost,
    /// Broker port is zero
    #[error("broker port must be positive")]
    InvalidBrokerPort,
    /// Client id is empty
    #[error("client id cannot be empty")]
    EmptyClientId,
    /// Topic string is empty
    #[error("topic cannot be empty")]
    EmptyTopic,
    /// Action key is empty
    #[error("action key cannot be empty")]
    EmptyActionKey,
    /// Topic already registered among incoming mappings
    #[error("incoming topic already registered: {0}")]
    DuplicateIncomingTopic(String),
    /// Topic already registered among outgoing mappings
    #[error("outgoing topic already registered: {0}")]
    DuplicateOutgoingTopic(String),
    /// Action key already bound to an outgoing mapping
    #[error("action key already registered: {0}")]
    DuplicateActionKey(String),
    /// General incoming mapping registered without related declarations
    #[error("incoming mapping on '{0}' must declare the properties or events it produces")]
    MissingRelatedDeclarations(String),
    /// Username without password or vice versa
    #[error("username and password must both be non-empty")]
    IncompleteCredentials,
    /// Connection timeout of zero
    #[error("connection timeout must be positive")]
    ZeroConnectionTimeout,
    /// Request queue capacity of zero
    #[error("queue capacity must be positive")]
    ZeroQueueCapacity,
    /// No property, event, or action declared
    #[error("adapter must declare at least one property, event, or action")]
    NoDeclarations,
    /// No incoming or outgoing mapping registered
    #[error("adapter must register at least one incoming or outgoing mapping")]
    NoMappings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::QosLevel;
    use serde_json::json;
    use std::collections::HashSet;

    fn identity(payload: &str) -> Result<Value, TranslationError> {
        Ok(Value::from(payload))
    }

    fn descriptor(topic: &str) -> TopicDescriptor {
        TopicDescriptor::new(topic).unwrap()
    }

    #[test]
    fn builder_rejects_empty_host_and_zero_port() {
        assert_eq!(
            AdapterConfiguration::builder("", 1883).unwrap_err(),
            ConfigurationError::EmptyBrokerHost
        );
        assert_eq!(
            AdapterConfiguration::builder("localhost", 0).unwrap_err(),
            ConfigurationError::InvalidBrokerPort
        );
    }

    #[test]
    fn defaults_applied_at_build() {
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_property_topic("intensity", json!(0), descriptor("sensor/intensity"), identity)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.connection_timeout(), DEFAULT_CONNECTION_TIMEOUT);
        assert_eq!(config.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
        assert!(config.automatic_reconnect());
        assert!(config.client_id().starts_with("twinlink-"));
        assert_eq!(config.broker_url(), "tcp://localhost:1883");
    }

    #[test]
    fn duplicate_incoming_topic_rejected_eagerly() {
        let result = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_property_topic("temperature", json!(0.0), descriptor("sensor/state"), identity)
            .unwrap()
            .add_property_topic("humidity", json!(0.0), descriptor("sensor/state"), identity);

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateIncomingTopic("sensor/state".to_string())
        );
    }

    #[test]
    fn duplicate_action_key_rejected() {
        let result = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_action_topic("switch-off", "sensor.actuation", "text/plain",
                descriptor("sensor/actions/a"), |_| Ok(String::new()))
            .unwrap()
            .add_action_topic("switch-off", "sensor.actuation", "text/plain",
                descriptor("sensor/actions/b"), |_| Ok(String::new()));

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateActionKey("switch-off".to_string())
        );
    }

    #[test]
    fn duplicate_outgoing_topic_rejected() {
        let result = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_action_topic("switch-off", "sensor.actuation", "text/plain",
                descriptor("sensor/actions/switch"), |_| Ok(String::new()))
            .unwrap()
            .add_action_topic("switch-on", "sensor.actuation", "text/plain",
                descriptor("sensor/actions/switch"), |_| Ok(String::new()));

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateOutgoingTopic("sensor/actions/switch".to_string())
        );
    }

    #[test]
    fn same_topic_allowed_on_both_sides() {
        // Incoming and outgoing uniqueness are independent sets: subscribe
        // and publish are different channels of communication.
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_property_topic("mode", json!("auto"), descriptor("device/mode"), identity)
            .unwrap()
            .add_action_topic("set-mode", "actuation", "text/plain",
                descriptor("device/mode"), |body| Ok(body.to_string()))
            .unwrap()
            .build()
            .unwrap();

        assert!(config.incoming_for_topic("device/mode").is_some());
        assert_eq!(config.outgoing_for_action("set-mode").unwrap().topic(), "device/mode");
    }

    #[test]
    fn empty_related_declarations_rejected() {
        let mapping = IncomingMapping::new(descriptor("sensor/state"), |_| Ok(vec![]));
        let result = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_incoming_mapping(mapping, vec![], vec![]);

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::MissingRelatedDeclarations("sensor/state".to_string())
        );
    }

    #[test]
    fn build_requires_declarations() {
        let result = AdapterConfiguration::builder("localhost", 1883).unwrap().build();
        assert_eq!(result.unwrap_err(), ConfigurationError::NoDeclarations);
    }

    #[test]
    fn build_requires_mappings() {
        let result = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .declare_property("temperature", json!(0.0))
            .build();
        assert_eq!(result.unwrap_err(), ConfigurationError::NoMappings);
    }

    #[test]
    fn declared_action_without_mapping_is_allowed() {
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_property_topic("intensity", json!(0), descriptor("sensor/intensity"), identity)
            .unwrap()
            .declare_action("no-op-action", "sensor.actuation", "text/plain")
            .build()
            .unwrap();

        assert!(config.asset_description().has_action("no-op-action"));
        assert!(config.outgoing_for_action("no-op-action").is_none());
    }

    #[test]
    fn incomplete_credentials_rejected() {
        let builder = AdapterConfiguration::builder("localhost", 1883).unwrap();
        assert_eq!(
            builder.credentials("user", "").unwrap_err(),
            ConfigurationError::IncompleteCredentials
        );
    }

    #[test]
    fn zero_timeout_and_capacity_rejected() {
        let builder = AdapterConfiguration::builder("localhost", 1883).unwrap();
        assert_eq!(
            builder.connection_timeout(Duration::ZERO).unwrap_err(),
            ConfigurationError::ZeroConnectionTimeout
        );

        let builder = AdapterConfiguration::builder("localhost", 1883).unwrap();
        assert_eq!(
            builder.queue_capacity(0).unwrap_err(),
            ConfigurationError::ZeroQueueCapacity
        );
    }

    #[test]
    fn built_topics_are_unique_per_side() {
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_property_topic("intensity", json!(0), descriptor("sensor/intensity"), identity)
            .unwrap()
            .add_event_topic("overheating", "text/plain", descriptor("sensor/overheating"), identity)
            .unwrap()
            .add_action_topic("switch-off", "sensor.actuation", "text/plain",
                descriptor("sensor/actions/switch"), |_| Ok(String::new()))
            .unwrap()
            .build()
            .unwrap();

        let incoming: HashSet<&str> =
            config.incoming_mappings().iter().map(IncomingMapping::topic).collect();
        assert_eq!(incoming.len(), config.incoming_mappings().len());

        let outgoing: HashSet<&str> =
            config.outgoing_mappings().values().map(OutgoingMapping::topic).collect();
        assert_eq!(outgoing.len(), config.outgoing_mappings().len());
    }

    #[test]
    fn registration_order_preserved_for_incoming() {
        let state = IncomingMapping::new(descriptor("sensor/state"), |_| Ok(vec![]));
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_property_topic("intensity", json!(0), descriptor("sensor/intensity"), identity)
            .unwrap()
            .add_incoming_mapping(
                state,
                vec![
                    AssetProperty::new("temperature", json!(0.0)),
                    AssetProperty::new("humidity", json!(0.0)),
                ],
                vec![],
            )
            .unwrap()
            .build()
            .unwrap();

        let topics: Vec<&str> =
            config.incoming_mappings().iter().map(IncomingMapping::topic).collect();
        assert_eq!(topics, vec!["sensor/intensity", "sensor/state"]);
        assert!(config.asset_description().has_property("humidity"));
    }

    #[test]
    fn mqtt_options_carry_connection_parameters() {
        let config = AdapterConfiguration::builder("broker.example.com", 8883)
            .unwrap()
            .client_id("twin-42")
            .unwrap()
            .credentials("user", "secret")
            .unwrap()
            .clean_session(false)
            .add_property_topic("intensity", json!(0), descriptor("sensor/intensity"), identity)
            .unwrap()
            .build()
            .unwrap();

        let options = config.mqtt_options();
        assert_eq!(options.client_id(), "twin-42");
        assert_eq!(options.broker_address(), ("broker.example.com".to_string(), 8883));
        assert!(!options.clean_session());
    }

    #[test]
    fn outgoing_delivery_policy_survives_build() {
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_action_topic(
                "set-target",
                "actuation",
                "text/plain",
                descriptor("actuator/target").with_qos(QosLevel::ExactlyOnce).with_retained(true),
                |body| Ok(body.to_string()),
            )
            .unwrap()
            .build()
            .unwrap();

        let mapping = config.outgoing_for_action("set-target").unwrap();
        assert_eq!(mapping.descriptor().qos(), QosLevel::ExactlyOnce);
        assert!(mapping.descriptor().retained());
    }

    #[test]
    fn descriptor_policy_survives_build() {
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_property_topic(
                "intensity",
                json!(0),
                descriptor("sensor/intensity").with_qos(QosLevel::ExactlyOnce).with_retained(true),
                identity,
            )
            .unwrap()
            .build()
            .unwrap();

        let mapping = config.incoming_for_topic("sensor/intensity").unwrap();
        assert_eq!(mapping.descriptor().qos(), QosLevel::ExactlyOnce);
        assert!(mapping.descriptor().retained());
    }
}
