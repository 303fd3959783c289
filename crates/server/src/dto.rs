//! Request and response bodies.

use serde::{Deserialize, Serialize};

use courier_domain::{Batch, BatchId, Notification};

/// One notification request, used by both the single and batch endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationItem {
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// A field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl NotificationItem {
    /// Field-presence and enum-membership checks done before the use case
    /// runs; byte limits stay with the domain rules.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.recipient.is_empty() {
            errors.push(ValidationError {
                field: "recipient",
                message: "recipient is required",
            });
        }

        if self.channel.is_empty() {
            errors.push(ValidationError {
                field: "channel",
                message: "channel is required",
            });
        } else if courier_domain::Channel::parse(&self.channel).is_none() {
            errors.push(ValidationError {
                field: "channel",
                message: "channel must be one of: sms, email, push",
            });
        }

        if self.content.is_empty() {
            errors.push(ValidationError {
                field: "content",
                message: "content is required",
            });
        }

        if let Some(priority) = self.priority.as_deref() {
            if !priority.is_empty() && courier_domain::Priority::parse(priority).is_none() {
                errors.push(ValidationError {
                    field: "priority",
                    message: "priority must be one of: high, normal, low",
                });
            }
        }

        errors
    }
}

/// Body of `POST /notifications/batches` responses.
#[derive(Debug, Serialize)]
pub struct BatchCreatedResponse {
    pub batch_id: BatchId,
    pub notifications: Vec<Notification>,
    pub skipped: usize,
}

/// Body of `GET /notifications` responses.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub notifications: Vec<Notification>,
    pub total: i64,
}

/// Body of `GET /batches/:id/notifications` responses.
#[derive(Debug, Serialize)]
pub struct BatchWithNotificationsResponse {
    pub batch: Batch,
    pub notifications: Vec<Notification>,
}

/// Body of `POST /batches/:id/cancel` responses.
#[derive(Debug, Serialize)]
pub struct CancelBatchResponse {
    pub cancelled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> NotificationItem {
        NotificationItem {
            recipient: "+905551234567".to_string(),
            channel: "sms".to_string(),
            content: "hi".to_string(),
            priority: Some("high".to_string()),
            idempotency_key: None,
        }
    }

    #[test]
    fn valid_item_passes() {
        assert!(item().validate().is_empty());
    }

    #[test]
    fn missing_priority_is_allowed() {
        let mut i = item();
        i.priority = None;
        assert!(i.validate().is_empty());
    }

    #[test]
    fn each_missing_field_is_reported() {
        let empty = NotificationItem {
            recipient: String::new(),
            channel: String::new(),
            content: String::new(),
            priority: None,
            idempotency_key: None,
        };
        let errors = empty.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["recipient", "channel", "content"]);
    }

    #[test]
    fn unknown_channel_and_priority_are_reported() {
        let mut i = item();
        i.channel = "fax".to_string();
        i.priority = Some("urgent".to_string());
        let errors = i.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "channel");
        assert_eq!(errors[1].field, "priority");
    }
}
