use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use courier_domain::{BatchId, Channel, NotificationId, Priority, Result};

/// Event payload published to the broker when a notification is admitted.
///
/// Field names are fixed on the wire; the worker and any external consumers
/// depend on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "NotificationID")]
    pub notification_id: NotificationId,
    #[serde(rename = "BatchID")]
    pub batch_id: Option<BatchId>,
    #[serde(rename = "Recipient")]
    pub recipient: String,
    #[serde(rename = "Channel")]
    pub channel: Channel,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[serde(rename = "IdempotencyKey")]
    pub idempotency_key: Option<String>,
    /// RFC 3339 creation timestamp.
    #[serde(rename = "CreatedAt")]
    pub created_at: String,
}

/// Publishes notification events to the broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &NotificationEvent) -> Result<()>;

    /// Sequential fail-fast publish; the caller owns re-drive on partial
    /// success.
    async fn publish_batch(&self, events: &[NotificationEvent]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn event_wire_format_uses_fixed_field_names() {
        let event = NotificationEvent {
            notification_id: NotificationId(Uuid::nil()),
            batch_id: None,
            recipient: "+905551234567".to_string(),
            channel: Channel::Sms,
            content: "hi".to_string(),
            priority: Priority::High,
            idempotency_key: Some("k1".to_string()),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };

        let value: serde_json::Value = serde_json::from_str(
            &serde_json::to_string(&event).unwrap(),
        )
        .unwrap();

        assert_eq!(
            value["NotificationID"],
            "00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(value["BatchID"], serde_json::Value::Null);
        assert_eq!(value["Channel"], "sms");
        assert_eq!(value["Priority"], "high");
        assert_eq!(value["IdempotencyKey"], "k1");
        assert_eq!(value["CreatedAt"], "2024-01-01T00:00:00Z");

        let back: NotificationEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn event_with_batch_serializes_batch_id() {
        let batch_id = BatchId::new();
        let event = NotificationEvent {
            notification_id: NotificationId::new(),
            batch_id: Some(batch_id),
            recipient: "a@b.c".to_string(),
            channel: Channel::Email,
            content: "hello".to_string(),
            priority: Priority::Normal,
            idempotency_key: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(value["BatchID"], batch_id.to_string());
        assert_eq!(value["IdempotencyKey"], serde_json::Value::Null);
    }
}
