//! Agent configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use url::Url;

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Broker host
    pub broker_host: String,
    /// Broker port
    pub broker_port: u16,
    /// MQTT client id (generated when unset)
    pub client_id: Option<String>,
    /// Broker credentials
    pub credentials: Option<(String, String)>,
    /// Period between simulated sensor readings
    pub sensor_period: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: None,
            credentials: None,
            sensor_period: Duration::from_secs(2),
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TWINLINK_MQTT_BROKER`: broker URL (e.g., `tcp://localhost:1883`)
    /// - `TWINLINK_CLIENT_ID`: MQTT client id
    /// - `TWINLINK_USERNAME` / `TWINLINK_PASSWORD`: broker credentials
    /// - `TWINLINK_SENSOR_PERIOD_MS`: simulated sensor period
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(broker) = std::env::var("TWINLINK_MQTT_BROKER") {
            let (host, port) = parse_broker_url(&broker)?;
            config.broker_host = host;
            config.broker_port = port;
        }

        if let Ok(client_id) = std::env::var("TWINLINK_CLIENT_ID") {
            config.client_id = Some(client_id);
        }

        match (
            std::env::var("TWINLINK_USERNAME"),
            std::env::var("TWINLINK_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => config.credentials = Some((username, password)),
            (Err(_), Err(_)) => {}
            _ => bail!("TWINLINK_USERNAME and TWINLINK_PASSWORD must be set together"),
        }

        if let Ok(period) = std::env::var("TWINLINK_SENSOR_PERIOD_MS") {
            let millis: u64 = period
                .parse()
                .context("Invalid TWINLINK_SENSOR_PERIOD_MS")?;
            config.sensor_period = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

/// Parse a broker URL into host and port.
///
/// A bare `host[:port]` is read as `tcp://host[:port]`; the port defaults
/// to 1883 either way.
fn parse_broker_url(input: &str) -> Result<(String, u16)> {
    let normalized = if input.contains("://") {
        input.to_string()
    } else {
        format!("tcp://{input}")
    };
    let url =
        Url::parse(&normalized).with_context(|| format!("invalid broker URL: {input}"))?;

    match url.scheme() {
        "tcp" | "mqtt" => {}
        scheme => bail!("{input}: unsupported scheme '{scheme}'"),
    }

    let host = url
        .host_str()
        .with_context(|| format!("{input}: missing host"))?;

    Ok((host.to_string(), url.port().unwrap_or(1883)))
}
