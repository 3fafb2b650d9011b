//! # Twinlink Agent
//!
//! Demo agent wiring a simulated engine sensor to a console twin:
//! - A simulated device publishes raw telemetry on `sensor/*` topics
//! - The MQTT dispatcher translates payloads into typed domain events
//! - The events are drained from a channel sink and logged
//! - A demo `switch-off` action is pushed back onto the wire

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use twinlink_core::{ActionRequest, AssetProperty, DomainEvent};
use twinlink_mqtt::{
    AdapterConfiguration, ChannelSink, IncomingMapping, MqttDispatcher, SinkMessage,
    TopicDescriptor, TranslationError,
};

mod config;
mod sensor;

use config::AgentConfig;

fn parse_int(payload: &str) -> Result<Value, TranslationError> {
    payload
        .trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|e| TranslationError::new(e.to_string()))
}

fn parse_state(payload: &str) -> Result<Vec<DomainEvent>, TranslationError> {
    let state: Value =
        serde_json::from_str(payload).map_err(|e| TranslationError::new(e.to_string()))?;
    Ok(vec![
        DomainEvent::property("temperature", state["t"].clone()),
        DomainEvent::property("humidity", state["h"].clone()),
    ])
}

fn build_configuration(cfg: &AgentConfig) -> Result<AdapterConfiguration> {
    let mut builder = AdapterConfiguration::builder(cfg.broker_host.clone(), cfg.broker_port)?;

    if let Some(client_id) = &cfg.client_id {
        builder = builder.client_id(client_id.as_str())?;
    }
    if let Some((username, password)) = &cfg.credentials {
        builder = builder.credentials(username.as_str(), password.as_str())?;
    }

    let configuration = builder
        .add_property_topic(
            "intensity",
            json!(0),
            TopicDescriptor::new(sensor::INTENSITY_TOPIC)?,
            parse_int,
        )?
        .add_incoming_mapping(
            IncomingMapping::new(TopicDescriptor::new(sensor::STATE_TOPIC)?, parse_state),
            vec![
                AssetProperty::new("temperature", json!(0.0)),
                AssetProperty::new("humidity", json!(0.0)),
            ],
            vec![],
        )?
        .add_event_topic(
            "overheating",
            "text/plain",
            TopicDescriptor::new(sensor::OVERHEATING_TOPIC)?,
            |payload| Ok(Value::from(payload)),
        )?
        .add_action_topic(
            "switch-off",
            "sensor.actuation",
            "text/plain",
            TopicDescriptor::new("sensor/actions/switch")?,
            |body| Ok(format!("switch-{body}")),
        )?
        .build()?;

    Ok(configuration)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Twinlink agent");

    let cfg = AgentConfig::from_env()?;
    let configuration = build_configuration(&cfg)?;

    let (sink, mut rx) = ChannelSink::new();
    let dispatcher = Arc::new(MqttDispatcher::new(configuration, Arc::new(sink)));
    dispatcher.start().await?;

    let device_id = format!("{}-device", dispatcher.configuration().client_id());
    tokio::spawn(sensor::run_sensor(
        device_id,
        cfg.broker_host.clone(),
        cfg.broker_port,
        cfg.sensor_period,
    ));

    // Fire one demo action once the bridge has settled.
    let action_dispatcher = Arc::clone(&dispatcher);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let action = ActionRequest::new("switch-off", json!("off"));
        if let Err(error) = action_dispatcher.handle_action(&action).await {
            tracing::warn!(error = %error, "demo action failed");
        }
    });

    tracing::info!("Agent running, press Ctrl+C to stop");

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(SinkMessage::Description(description)) => {
                    tracing::info!(
                        properties = description.properties.len(),
                        events = description.events.len(),
                        actions = description.actions.len(),
                        "asset description announced"
                    );
                }
                Some(SinkMessage::Event(DomainEvent::PropertyUpdate(update))) => {
                    tracing::info!(key = %update.key, value = %update.value, "property update");
                }
                Some(SinkMessage::Event(DomainEvent::EventNotification(notification))) => {
                    tracing::info!(key = %notification.key, body = %notification.body, "event notification");
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    dispatcher.stop().await?;
    tracing::info!("Agent stopped");
    Ok(())
}
