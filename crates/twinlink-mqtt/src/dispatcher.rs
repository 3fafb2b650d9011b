//! Adapter dispatcher: owns the broker connection and drives the lifecycle.
//!
//! One dispatcher owns one connection. Inbound messages arrive on the event
//! loop task and are translated and forwarded to the runtime sink; outbound
//! action requests are translated and published through the shared client,
//! whose request channel serializes concurrent publishes at the connection
//! level.

use crate::config::AdapterConfiguration;
use crate::outgoing::OutgoingMapping;
use crate::topic::TranslationError;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Packet, QoS};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use twinlink_core::{ActionRequest, DomainEvent, TwinSink};

/// Delay before re-polling the event loop after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Grace period for the event-loop task to wind down on stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Dispatcher lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, not yet started
    Created,
    /// Connection and subscriptions being established
    Starting,
    /// Bridging messages
    Running,
    /// Disconnect in progress
    Stopping,
    /// Disconnected
    Stopped,
    /// Unrecoverable failure during start
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Runtime component bridging the broker and the runtime sink.
///
/// The configuration is shared read-only for the life of the adapter; the
/// dispatcher owns and mutates only connection and subscription state.
pub struct MqttDispatcher {
    config: Arc<AdapterConfiguration>,
    sink: Arc<dyn TwinSink>,
    state: Arc<Mutex<LifecycleState>>,
    client: Mutex<Option<AsyncClient>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MqttDispatcher {
    /// Create a dispatcher in the `Created` state.
    pub fn new(config: AdapterConfiguration, sink: Arc<dyn TwinSink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            state: Arc::new(Mutex::new(LifecycleState::Created)),
            client: Mutex::new(None),
            loop_handle: Mutex::new(None),
        }
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    /// The shared configuration.
    #[must_use]
    pub fn configuration(&self) -> &AdapterConfiguration {
        &self.config
    }

    /// Connect, subscribe every incoming mapping, announce the asset
    /// description, and begin bridging.
    ///
    /// On any failure during this sequence the dispatcher transitions to
    /// `Failed` and the error is returned; there is no internal retry.
    /// Reconnection after the initial handshake is the transport's concern,
    /// governed by the automatic-reconnect flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher was already started, the broker
    /// cannot be reached within the connection timeout, or a subscription is
    /// refused.
    pub async fn start(&self) -> Result<(), DispatcherError> {
        {
            let mut state = self.lock_state();
            if *state != LifecycleState::Created {
                return Err(DispatcherError::AlreadyStarted(*state));
            }
            *state = LifecycleState::Starting;
        }

        tracing::info!(
            broker = %self.config.broker_url(),
            client_id = %self.config.client_id(),
            "starting MQTT dispatcher"
        );

        match self.connect_and_subscribe().await {
            Ok(()) => {
                self.set_state(LifecycleState::Running);
                tracing::info!("MQTT dispatcher running");
                Ok(())
            }
            Err(error) => {
                self.set_state(LifecycleState::Failed);
                tracing::error!(error = %error, "MQTT dispatcher failed to start");
                Err(error)
            }
        }
    }

    async fn connect_and_subscribe(&self) -> Result<(), DispatcherError> {
        let (client, mut eventloop) =
            AsyncClient::new(self.config.mqtt_options(), self.config.queue_capacity());

        wait_for_connack(&mut eventloop, self.config.connection_timeout()).await?;

        for mapping in self.config.incoming_mappings() {
            client
                .subscribe(mapping.topic(), QoS::from(mapping.descriptor().qos()))
                .await
                .map_err(|e| DispatcherError::Subscribe(e.to_string()))?;
            tracing::debug!(topic = mapping.topic(), "subscribed to incoming topic");
        }

        self.sink.on_asset_description(self.config.asset_description());

        *self.client.lock().expect("client lock poisoned") = Some(client);
        let handle = tokio::spawn(run_event_loop(
            eventloop,
            Arc::clone(&self.config),
            Arc::clone(&self.sink),
            Arc::clone(&self.state),
        ));
        *self.loop_handle.lock().expect("loop handle lock poisoned") = Some(handle);

        Ok(())
    }

    /// Translate and publish a runtime action request.
    ///
    /// An action with no outgoing mapping registered for its key is dropped
    /// silently: not every declared action needs a wire mapping. One publish
    /// attempt per action; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher is not running, the translation
    /// function fails, or the publish attempt fails.
    pub async fn handle_action(&self, action: &ActionRequest) -> Result<(), DispatcherError> {
        let state = self.state();
        if state != LifecycleState::Running {
            return Err(DispatcherError::NotRunning(state));
        }

        let Some((mapping, payload)) = translate_action(&self.config, action)? else {
            return Ok(());
        };
        let payload_len = payload.len();

        let client = self
            .client
            .lock()
            .expect("client lock poisoned")
            .clone()
            .ok_or(DispatcherError::NotRunning(state))?;

        client
            .publish(
                mapping.topic(),
                QoS::from(mapping.descriptor().qos()),
                mapping.descriptor().retained(),
                payload,
            )
            .await
            .map_err(|e| DispatcherError::Publish(e.to_string()))?;

        tracing::info!(
            action = %action.key,
            topic = mapping.topic(),
            payload_len,
            "published action"
        );
        Ok(())
    }

    /// Disconnect from the broker and stop bridging.
    ///
    /// Idempotent: from any state other than `Running` this is a no-op. No
    /// further sink callbacks are guaranteed to fire after it returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker disconnect fails; the dispatcher still
    /// ends in `Stopped`.
    pub async fn stop(&self) -> Result<(), DispatcherError> {
        {
            let mut state = self.lock_state();
            if *state != LifecycleState::Running {
                return Ok(());
            }
            *state = LifecycleState::Stopping;
        }

        let client = self.client.lock().expect("client lock poisoned").take();
        let result = match client {
            Some(client) => client
                .disconnect()
                .await
                .map_err(|e| DispatcherError::Disconnect(e.to_string())),
            None => Ok(()),
        };

        let handle = self.loop_handle.lock().expect("loop handle lock poisoned").take();
        if let Some(handle) = handle {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                tracing::warn!("event loop did not wind down in time");
            }
        }

        self.set_state(LifecycleState::Stopped);
        tracing::info!("MQTT dispatcher stopped");
        result
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().expect("lifecycle state lock poisoned")
    }

    fn set_state(&self, next: LifecycleState) {
        let mut state = self.lock_state();
        tracing::debug!(from = %*state, to = %next, "lifecycle transition");
        *state = next;
    }
}

impl fmt::Debug for MqttDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttDispatcher")
            .field("state", &self.state())
            .field("broker", &self.config.broker_url())
            .finish_non_exhaustive()
    }
}

/// Drive the event loop until the broker acknowledges the connection.
async fn wait_for_connack(
    eventloop: &mut EventLoop,
    limit: Duration,
) -> Result<(), DispatcherError> {
    let connack = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    return if ack.code == ConnectReturnCode::Success {
                        Ok(())
                    } else {
                        Err(DispatcherError::Connection(format!(
                            "broker refused connection: {:?}",
                            ack.code
                        )))
                    };
                }
                Ok(_) => {}
                Err(error) => return Err(DispatcherError::Connection(error.to_string())),
            }
        }
    };

    match tokio::time::timeout(limit, connack).await {
        Ok(result) => result,
        Err(_) => Err(DispatcherError::ConnectTimeout(limit.as_secs())),
    }
}

/// Event-loop task: translate and forward inbound messages until the
/// dispatcher leaves `Running` or the connection becomes unrecoverable.
async fn run_event_loop(
    mut eventloop: EventLoop,
    config: Arc<AdapterConfiguration>,
    sink: Arc<dyn TwinSink>,
    state: Arc<Mutex<LifecycleState>>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_publish(&config, sink.as_ref(), &publish.topic, publish.payload.as_ref());
            }
            Ok(_) => {}
            Err(error) => {
                let running =
                    *state.lock().expect("lifecycle state lock poisoned") == LifecycleState::Running;
                if !running || !config.automatic_reconnect() {
                    tracing::debug!(error = %error, "event loop ending");
                    break;
                }
                tracing::error!(error = %error, "MQTT connection error, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Resolve an action into the mapping and wire payload to publish.
///
/// An action whose key has no outgoing mapping resolves to `None`: not every
/// declared action needs a wire mapping, and invoking one publishes nothing.
fn translate_action<'a>(
    config: &'a AdapterConfiguration,
    action: &ActionRequest,
) -> Result<Option<(&'a OutgoingMapping, String)>, DispatcherError> {
    let Some(mapping) = config.outgoing_for_action(&action.key) else {
        tracing::debug!(action = %action.key, "no outgoing mapping for action, dropping");
        return Ok(None);
    };
    let payload = mapping.translate(action)?;
    Ok(Some((mapping, payload)))
}

/// Translate one inbound message and forward its events in order.
fn handle_publish(config: &AdapterConfiguration, sink: &dyn TwinSink, topic: &str, payload: &[u8]) {
    let Some(mapping) = config.incoming_for_topic(topic) else {
        // Subscriptions are only created for registered mappings, but a
        // retained message from an old session can still land here.
        tracing::debug!(topic, "no incoming mapping for topic, ignoring");
        return;
    };

    let Ok(payload) = std::str::from_utf8(payload) else {
        tracing::warn!(topic, "non-UTF-8 payload, message dropped");
        return;
    };

    match mapping.translate(payload) {
        Ok(events) => {
            for event in events {
                warn_if_undeclared(config, &event);
                sink.forward(event);
            }
        }
        Err(error) => {
            tracing::warn!(topic, error = %error, "translation failed, message dropped");
        }
    }
}

fn warn_if_undeclared(config: &AdapterConfiguration, event: &DomainEvent) {
    let declared = match event {
        DomainEvent::PropertyUpdate(update) => {
            config.asset_description().has_property(&update.key)
        }
        DomainEvent::EventNotification(notification) => {
            config.asset_description().has_event(&notification.key)
        }
    };
    if !declared {
        tracing::warn!(key = event.key(), "mapping produced an undeclared key");
    }
}

/// A failed dispatcher operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatcherError {
    /// `start()` called on a dispatcher that already left `Created`
    #[error("dispatcher already started (state: {0})")]
    AlreadyStarted(LifecycleState),
    /// Operation requires the `Running` state
    #[error("dispatcher is not running (state: {0})")]
    NotRunning(LifecycleState),
    /// Broker connection failed
    #[error("connection error: {0}")]
    Connection(String),
    /// Broker did not acknowledge the connection in time
    #[error("connection attempt timed out after {0}s")]
    ConnectTimeout(u64),
    /// Broker refused a subscription
    #[error("subscribe error: {0}")]
    Subscribe(String),
    /// Outbound translation function failed
    #[error("action translation failed: {0}")]
    Translation(#[from] TranslationError),
    /// Publish attempt failed; the action is undelivered
    #[error("publish error: {0}")]
    Publish(String),
    /// Broker disconnect failed
    #[error("disconnect error: {0}")]
    Disconnect(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfiguration;
    use crate::topic::TopicDescriptor;
    use serde_json::{json, Value};
    use std::sync::Mutex as StdMutex;
    use twinlink_core::{AssetDescription, EventNotification, PropertyUpdate};

    #[derive(Default)]
    struct RecordingSink {
        descriptions: StdMutex<Vec<AssetDescription>>,
        events: StdMutex<Vec<DomainEvent>>,
    }

    impl TwinSink for RecordingSink {
        fn on_asset_description(&self, description: &AssetDescription) {
            self.descriptions.lock().unwrap().push(description.clone());
        }

        fn on_property_update(&self, update: PropertyUpdate) {
            self.events.lock().unwrap().push(DomainEvent::PropertyUpdate(update));
        }

        fn on_event_notification(&self, notification: EventNotification) {
            self.events.lock().unwrap().push(DomainEvent::EventNotification(notification));
        }
    }

    fn parse_int(payload: &str) -> Result<Value, crate::topic::TranslationError> {
        payload
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| crate::topic::TranslationError::new(e.to_string()))
    }

    fn test_config() -> AdapterConfiguration {
        AdapterConfiguration::builder("127.0.0.1", 1)
            .unwrap()
            .connection_timeout(Duration::from_millis(500))
            .unwrap()
            .add_property_topic(
                "intensity",
                json!(0),
                TopicDescriptor::new("sensor/intensity").unwrap(),
                parse_int,
            )
            .unwrap()
            .declare_action("no-op-action", "sensor.actuation", "text/plain")
            .build()
            .unwrap()
    }

    #[test]
    fn new_dispatcher_is_created() {
        let dispatcher = MqttDispatcher::new(test_config(), Arc::new(RecordingSink::default()));
        assert_eq!(dispatcher.state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn stop_before_start_is_a_noop() {
        let dispatcher = MqttDispatcher::new(test_config(), Arc::new(RecordingSink::default()));
        dispatcher.stop().await.unwrap();
        dispatcher.stop().await.unwrap();
        assert_eq!(dispatcher.state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn action_rejected_while_not_running() {
        let dispatcher = MqttDispatcher::new(test_config(), Arc::new(RecordingSink::default()));
        let action = ActionRequest::new("switch-off", json!("off"));
        let error = dispatcher.handle_action(&action).await.unwrap_err();
        assert!(matches!(error, DispatcherError::NotRunning(LifecycleState::Created)));
    }

    #[tokio::test]
    async fn unreachable_broker_fails_the_start() {
        // Port 1 refuses immediately; no broker listens there.
        let dispatcher = MqttDispatcher::new(test_config(), Arc::new(RecordingSink::default()));

        let error = dispatcher.start().await.unwrap_err();
        assert!(matches!(
            error,
            DispatcherError::Connection(_) | DispatcherError::ConnectTimeout(_)
        ));
        assert_eq!(dispatcher.state(), LifecycleState::Failed);

        // Idempotent stop from the terminal state.
        dispatcher.stop().await.unwrap();
        assert_eq!(dispatcher.state(), LifecycleState::Failed);

        // A failed dispatcher cannot be restarted.
        let error = dispatcher.start().await.unwrap_err();
        assert!(matches!(error, DispatcherError::AlreadyStarted(LifecycleState::Failed)));
    }

    #[test]
    fn unmapped_action_resolves_to_no_publish() {
        // "no-op-action" is declared but has no outgoing mapping.
        let config = test_config();
        let resolved =
            translate_action(&config, &ActionRequest::new("no-op-action", json!("off")));
        assert!(resolved.unwrap().is_none());
    }

    #[test]
    fn mapped_action_resolves_to_topic_and_payload() {
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_action_topic(
                "switch-off",
                "sensor.actuation",
                "text/plain",
                TopicDescriptor::new("sensor/actions/switch").unwrap(),
                |body| Ok(format!("switch-{body}")),
            )
            .unwrap()
            .build()
            .unwrap();

        let (mapping, payload) =
            translate_action(&config, &ActionRequest::new("switch-off", json!("off")))
                .unwrap()
                .unwrap();
        assert_eq!(mapping.topic(), "sensor/actions/switch");
        assert_eq!(payload, "switch-\"off\"");

        // An undeclared key resolves the same way as an unmapped one.
        let resolved = translate_action(&config, &ActionRequest::new("ghost", json!(null)));
        assert!(resolved.unwrap().is_none());
    }

    #[test]
    fn translate_and_forward_in_order() {
        let config = AdapterConfiguration::builder("localhost", 1883)
            .unwrap()
            .add_incoming_mapping(
                crate::incoming::IncomingMapping::new(
                    TopicDescriptor::new("sensor/state").unwrap(),
                    |payload| {
                        let state: Value = serde_json::from_str(payload)
                            .map_err(|e| crate::topic::TranslationError::new(e.to_string()))?;
                        Ok(vec![
                            DomainEvent::property("temperature", state["t"].clone()),
                            DomainEvent::property("humidity", state["h"].clone()),
                        ])
                    },
                ),
                vec![
                    twinlink_core::AssetProperty::new("temperature", json!(0.0)),
                    twinlink_core::AssetProperty::new("humidity", json!(0.0)),
                ],
                vec![],
            )
            .unwrap()
            .build()
            .unwrap();
        let sink = RecordingSink::default();

        handle_publish(&config, &sink, "sensor/state", br#"{"t":80.0,"h":55.0}"#);

        let events = sink.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                DomainEvent::property("temperature", json!(80.0)),
                DomainEvent::property("humidity", json!(55.0)),
            ]
        );
    }

    #[test]
    fn malformed_payload_degrades_gracefully() {
        let config = test_config();
        let sink = RecordingSink::default();

        handle_publish(&config, &sink, "sensor/intensity", b"not-a-number");
        handle_publish(&config, &sink, "sensor/intensity", &[0xff, 0xfe]);
        handle_publish(&config, &sink, "sensor/unknown", b"42");

        assert!(sink.events.lock().unwrap().is_empty());

        // Dispatch continues after bad messages.
        handle_publish(&config, &sink, "sensor/intensity", b"42");
        assert_eq!(
            *sink.events.lock().unwrap(),
            vec![DomainEvent::property("intensity", json!(42))]
        );
    }
}
