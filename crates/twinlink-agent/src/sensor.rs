//! Simulated engine sensor publishing raw telemetry over its own
//! MQTT connection, standing in for a physical device.

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Topic carrying the raw intensity reading.
pub const INTENSITY_TOPIC: &str = "sensor/intensity";
/// Topic carrying the combined JSON state document.
pub const STATE_TOPIC: &str = "sensor/state";
/// Topic carrying overheating alerts.
pub const OVERHEATING_TOPIC: &str = "sensor/overheating";

/// Engine telemetry generator: temperature in 80..100, humidity in 50..70.
pub struct EngineSensor {
    seed: u64,
}

impl EngineSensor {
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1);
        Self { seed: seed | 1 }
    }

    // xorshift, good enough for demo telemetry
    fn next_fraction(&mut self) -> f64 {
        self.seed ^= self.seed << 13;
        self.seed ^= self.seed >> 7;
        self.seed ^= self.seed << 17;
        (self.seed >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn temperature(&mut self) -> f64 {
        80.0 + self.next_fraction() * 20.0
    }

    pub fn humidity(&mut self) -> f64 {
        50.0 + self.next_fraction() * 20.0
    }

    pub fn intensity(&mut self) -> i64 {
        (self.next_fraction() * 100.0) as i64
    }
}

/// Run the simulated device loop until the client stops accepting requests.
pub async fn run_sensor(client_id: String, host: String, port: u16, period: Duration) {
    let mut options = MqttOptions::new(client_id, host, port);
    options.set_keep_alive(Duration::from_secs(5));
    let (client, eventloop) = AsyncClient::new(options, 10);
    tokio::spawn(drive_eventloop(eventloop));

    let mut sensor = EngineSensor::new();
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;

        let temperature = sensor.temperature();
        let humidity = sensor.humidity();
        let intensity = sensor.intensity();

        let state = format!(r#"{{"t":{temperature:.1},"h":{humidity:.1}}}"#);

        if client
            .publish(INTENSITY_TOPIC, QoS::AtMostOnce, false, intensity.to_string())
            .await
            .is_err()
        {
            break;
        }
        if client
            .publish(STATE_TOPIC, QoS::AtMostOnce, false, state)
            .await
            .is_err()
        {
            break;
        }

        if temperature > 95.0 {
            let _ = client
                .publish(OVERHEATING_TOPIC, QoS::AtLeastOnce, false, "critical")
                .await;
        }

        tracing::debug!(temperature, humidity, intensity, "sensor published telemetry");
    }

    tracing::info!("sensor loop ended");
}

async fn drive_eventloop(mut eventloop: EventLoop) {
    loop {
        if eventloop.poll().await.is_err() {
            break;
        }
    }
}
