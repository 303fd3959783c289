//! Event publisher.

use async_trait::async_trait;
use chrono::Utc;
use lapin::options::BasicPublishOptions;
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Connection, ConnectionProperties};
use tracing::info;

use courier_application::ports::{EventPublisher, NotificationEvent};
use courier_domain::{DomainError, Result};

use super::topology::{declare_topology, EXCHANGE_NAME};

/// AMQP delivery mode 2 = persistent (survives broker restart).
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Publishes notification events to the `notifications` exchange.
pub struct RabbitMqPublisher {
    conn: Connection,
    channel: lapin::Channel,
}

impl RabbitMqPublisher {
    /// Dial the broker, open a channel, and declare the topology.
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| DomainError::infrastructure(format!("rabbitmq dial: {e}")))?;
        let channel = conn
            .create_channel()
            .await
            .map_err(|e| DomainError::infrastructure(format!("rabbitmq channel: {e}")))?;
        declare_topology(&channel)
            .await
            .map_err(|e| DomainError::infrastructure(format!("rabbitmq topology: {e}")))?;

        info!("rabbitmq publisher connected");
        Ok(Self { conn, channel })
    }

    async fn publish_event(&self, event: &NotificationEvent) -> Result<()> {
        let body = serde_json::to_vec(event)
            .map_err(|e| DomainError::infrastructure(format!("encode event: {e}")))?;

        let priority = event.priority.amqp_priority();
        let mut headers = FieldTable::default();
        headers.insert("priority".into(), AMQPValue::LongInt(priority as i32));

        let properties = BasicProperties::default()
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_content_type("application/json".into())
            .with_priority(priority)
            .with_timestamp(Utc::now().timestamp() as u64)
            .with_headers(headers);

        self.channel
            .basic_publish(
                EXCHANGE_NAME,
                event.channel.as_str(),
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await
            .map_err(|e| DomainError::infrastructure(format!("rabbitmq publish: {e}")))?
            .await
            .map_err(|e| DomainError::infrastructure(format!("rabbitmq publish confirm: {e}")))?;

        Ok(())
    }

    /// Close the channel and connection.
    pub async fn close(&self) {
        let _ = self.channel.close(200, "shutdown").await;
        let _ = self.conn.close(200, "shutdown").await;
    }
}

#[async_trait]
impl EventPublisher for RabbitMqPublisher {
    async fn publish(&self, event: &NotificationEvent) -> Result<()> {
        self.publish_event(event).await
    }

    async fn publish_batch(&self, events: &[NotificationEvent]) -> Result<()> {
        // Sequential and fail-fast; the admission path owns re-drive on
        // partial success.
        for event in events {
            self.publish_event(event).await?;
        }
        Ok(())
    }
}
