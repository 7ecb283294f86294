//! MQTT Transport Bridge
//!
//! Connects the monitor to the broker:
//! - Sensor topic subscription feeding a bounded inbound queue
//! - Automatic resubscribe after reconnects
//! - Non-blocking alert publishing

use alerting::{Alert, AlertSink, PublishError};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("No CONNACK from broker within {0}s")]
    Timeout(u64),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}

/// MQTT configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host name
    pub broker_host: String,
    pub broker_port: u16,
    /// Client id prefix; a random suffix keeps instances distinct
    pub client_id_prefix: String,
    /// Topic filter addressing every machine's readings
    pub sensor_topic: String,
    pub alert_topic: String,
    pub keep_alive_secs: u64,
    /// Startup wait for the first CONNACK
    pub connect_timeout_secs: u64,
    /// Pause after a connection error before polling again
    pub reconnect_backoff_secs: u64,
    /// Inbound queue capacity (messages)
    pub queue_capacity: usize,
    /// Client request channel capacity (pending publishes and subscribes).
    /// Requests are only drained while the event loop polls, which pauses
    /// whenever the inbound queue is full.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "broker.hivemq.com".to_string(),
            broker_port: 1883,
            client_id_prefix: "ml_monitor".to_string(),
            sensor_topic: "factory/machines/+/sensors".to_string(),
            alert_topic: "factory/alerts/anomaly".to_string(),
            keep_alive_secs: 60,
            connect_timeout_secs: 10,
            reconnect_backoff_secs: 5,
            queue_capacity: 256,
            request_capacity: 64,
        }
    }
}

impl MqttConfig {
    /// Client id with a short random suffix
    pub fn client_id(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}_{}", self.client_id_prefix, &suffix[..8])
    }
}

/// Raw message handed from the transport to the consumer loop
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Connected MQTT client plus its event-loop task
pub struct MqttBridge {
    client: AsyncClient,
    alert_topic: String,
    event_loop: Option<JoinHandle<()>>,
}

impl MqttBridge {
    /// Connect, subscribe to the sensor topic and start forwarding messages.
    ///
    /// Fails if the broker does not acknowledge the connection in time; this
    /// is the only fatal transport error.
    pub async fn connect(
        config: &MqttConfig,
    ) -> Result<(Self, mpsc::Receiver<InboundMessage>), TransportError> {
        let mut options = MqttOptions::new(
            config.client_id(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        info!(
            "Connecting to MQTT broker {}:{}",
            config.broker_host, config.broker_port
        );

        let (client, mut eventloop) = AsyncClient::new(options, config.request_capacity.max(1));
        wait_for_connack(&mut eventloop, config.connect_timeout_secs).await?;

        client
            .subscribe(config.sensor_topic.clone(), QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::Subscribe(e.to_string()))?;
        info!("Subscribed to: {}", config.sensor_topic);

        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let task = tokio::spawn(run_event_loop(
            eventloop,
            client.clone(),
            config.sensor_topic.clone(),
            Duration::from_secs(config.reconnect_backoff_secs),
            tx,
        ));

        Ok((
            Self {
                client,
                alert_topic: config.alert_topic.clone(),
                event_loop: Some(task),
            },
            rx,
        ))
    }

    /// Disconnect from the broker and stop the event loop
    pub async fn shutdown(mut self) {
        if let Err(e) = self.client.disconnect().await {
            warn!("MQTT disconnect failed: {}", e);
        }
        if let Some(mut task) = self.event_loop.take() {
            // Give the loop a moment to flush the DISCONNECT packet
            if tokio::time::timeout(Duration::from_millis(500), &mut task)
                .await
                .is_err()
            {
                task.abort();
            }
        }
        info!("Disconnected from MQTT broker");
    }
}

impl Drop for MqttBridge {
    fn drop(&mut self) {
        if let Some(task) = self.event_loop.take() {
            task.abort();
        }
    }
}

impl AlertSink for MqttBridge {
    fn publish(&self, alert: &Alert) -> Result<(), PublishError> {
        let payload = alert_payload(alert)?;
        self.client
            .try_publish(self.alert_topic.clone(), QoS::ExactlyOnce, false, payload)
            .map_err(|e| PublishError::Delivery(e.to_string()))?;
        debug!(alert_id = %alert.alert_id, topic = %self.alert_topic, "Queued alert for publish");
        Ok(())
    }
}

/// JSON wire encoding of an alert
pub fn alert_payload(alert: &Alert) -> Result<Vec<u8>, PublishError> {
    serde_json::to_vec(alert).map_err(|e| PublishError::Serialization(e.to_string()))
}

async fn wait_for_connack(eventloop: &mut EventLoop, timeout_secs: u64) -> Result<(), TransportError> {
    let handshake = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                Ok(_) => continue,
                Err(e) => return Err(TransportError::Connection(e.to_string())),
            }
        }
    };

    tokio::time::timeout(Duration::from_secs(timeout_secs), handshake)
        .await
        .map_err(|_| TransportError::Timeout(timeout_secs))?
}

/// Drive the connection, forwarding publishes into the bounded queue.
///
/// Sending waits when the queue is full, which applies backpressure to the
/// broker instead of dropping readings. While it waits the client's request
/// channel is not drained, so alert publishes fail fast with a full-channel
/// error once `request_capacity` requests are pending; the alert itself stays
/// recorded.
async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    sensor_topic: String,
    backoff: Duration,
    tx: mpsc::Sender<InboundMessage>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                if tx.send(message).await.is_err() {
                    debug!("Inbound queue closed, stopping MQTT event loop");
                    break;
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Reconnected to MQTT broker, resubscribing to {}", sensor_topic);
                if let Err(e) = client.try_subscribe(sensor_topic.clone(), QoS::AtLeastOnce) {
                    error!("Resubscribe failed: {}", e);
                }
            }
            Ok(Event::Incoming(incoming)) => {
                debug!("MQTT incoming: {:?}", incoming);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("Disconnect sent, stopping MQTT event loop");
                break;
            }
            Ok(Event::Outgoing(_)) => {}
            Err(e) => {
                error!("MQTT connection error: {}", e);
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertManager;
    use feature_engine::SensorReading;

    #[test]
    fn test_default_topics() {
        let config = MqttConfig::default();
        assert_eq!(config.sensor_topic, "factory/machines/+/sensors");
        assert_eq!(config.alert_topic, "factory/alerts/anomaly");
        assert_eq!(config.broker_port, 1883);
    }

    #[tokio::test]
    async fn test_publish_fails_fast_when_requests_back_up() {
        // A client whose event loop is never polled models a stalled loop
        let config = MqttConfig {
            request_capacity: 2,
            ..Default::default()
        };
        let options = MqttOptions::new(config.client_id(), "127.0.0.1", 1);
        let (client, _eventloop) = AsyncClient::new(options, config.request_capacity);
        let bridge = MqttBridge {
            client,
            alert_topic: config.alert_topic.clone(),
            event_loop: None,
        };

        let mut manager = AlertManager::default();
        let reading = SensorReading::new("MACHINE_003", 120.0, 8.0, 20.0, 6.0, 1200.0);
        let results: Vec<_> = (0..4)
            .map(|_| {
                let alert = manager.raise(&reading, -0.61, "2024-05-01T12:00:00".to_string());
                bridge.publish(&alert)
            })
            .collect();

        assert!(results[..2].iter().all(|r| r.is_ok()));
        assert!(matches!(results[2], Err(PublishError::Delivery(_))));
        assert_eq!(MqttConfig::default().request_capacity, 64);
    }

    #[test]
    fn test_client_ids_are_distinct() {
        let config = MqttConfig::default();
        let a = config.client_id();
        let b = config.client_id();

        assert!(a.starts_with("ml_monitor_"));
        assert_eq!(a.len(), "ml_monitor_".len() + 8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_alert_payload_is_json() {
        let mut manager = AlertManager::default();
        let reading = SensorReading::new("MACHINE_003", 120.0, 8.0, 20.0, 6.0, 1200.0);
        let alert = manager.raise(&reading, -0.61, "2024-05-01T12:00:00".to_string());

        let payload = alert_payload(&alert).unwrap();
        let decoded: Alert = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, alert);
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_at_startup() {
        let config = MqttConfig {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1,
            connect_timeout_secs: 5,
            ..Default::default()
        };

        let result = MqttBridge::connect(&config).await;
        assert!(matches!(
            result,
            Err(TransportError::Connection(_)) | Err(TransportError::Timeout(_))
        ));
    }
}
