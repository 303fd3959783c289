use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AttemptId, BatchId, NotificationId};

use super::channel::Channel;
use super::priority::Priority;
use super::status::Status;

/// The aggregate root: one notification request.
///
/// Owned by the repository; rows are never destroyed, only soft-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub batch_id: Option<BatchId>,
    pub recipient: String,
    pub channel: Channel,
    pub content: String,
    pub priority: Priority,
    pub status: Status,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl Notification {
    /// Build a freshly admitted notification in `pending` state.
    pub fn new(
        recipient: impl Into<String>,
        channel: Channel,
        content: impl Into<String>,
        priority: Priority,
        idempotency_key: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NotificationId::new(),
            batch_id: None,
            recipient: recipient.into(),
            channel,
            content: content.into(),
            priority,
            status: Status::Pending,
            idempotency_key,
            created_at: now,
            updated_at: now,
            sent_at: None,
            failure_reason: None,
        }
    }

    pub fn with_batch(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Groups notifications created together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(idempotency_key: Option<String>) -> Self {
        Self {
            id: BatchId::new(),
            idempotency_key,
            created_at: Utc::now(),
        }
    }
}

/// One delivery attempt. Append-only; written by the delivery engine and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: AttemptId,
    pub notification_id: NotificationId,
    pub attempt_number: u32,
    pub success: bool,
    /// HTTP-style status code of the sink response; 0 when no response.
    pub status_code: u16,
    pub response_body: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DeliveryAttempt {
    pub fn succeeded(
        notification_id: NotificationId,
        attempt_number: u32,
        status_code: u16,
        response_body: impl Into<String>,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            notification_id,
            attempt_number,
            success: true,
            status_code,
            response_body: response_body.into(),
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn failed(
        notification_id: NotificationId,
        attempt_number: u32,
        status_code: u16,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            notification_id,
            attempt_number,
            success: false,
            status_code,
            response_body: String::new(),
            error_message: Some(error_message.into()),
            created_at: Utc::now(),
        }
    }
}
