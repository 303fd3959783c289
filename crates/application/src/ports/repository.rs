use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courier_domain::{
    Batch, BatchId, Channel, DeliveryAttempt, Notification, NotificationId, Result, Status,
};

/// Filter for listing notifications.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<Status>,
    pub channel: Option<Channel>,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    pub batch_id: Option<BatchId>,
    /// Page size, clamped to 1..=1000 by callers (default 100).
    pub limit: i64,
    pub offset: i64,
}

/// Page of notifications plus the pre-pagination match count.
#[derive(Debug, Clone)]
pub struct ListResult {
    pub notifications: Vec<Notification>,
    pub total: i64,
}

/// Durable storage for notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a new row. A violation of the idempotency-key uniqueness
    /// constraint maps to [`courier_domain::DomainError::DuplicateRequest`].
    async fn create(&self, notification: &Notification) -> Result<()>;

    /// Bulk-insert rows, chunked by the implementation.
    async fn create_batch(&self, notifications: &[Notification]) -> Result<()>;

    /// Fetch one live row; `NotFound` when absent.
    async fn get_by_id(&self, id: &NotificationId) -> Result<Notification>;

    async fn get_by_batch_id(&self, batch_id: &BatchId) -> Result<Vec<Notification>>;

    /// Update the status (and `sent_at` / `failure_reason` when given);
    /// `updated_at` is refreshed. `NotFound` when no live row matches.
    async fn update_status(
        &self,
        id: &NotificationId,
        status: Status,
        sent_at: Option<DateTime<Utc>>,
        failure_reason: Option<String>,
    ) -> Result<()>;

    async fn list(&self, filter: &ListFilter) -> Result<ListResult>;

    /// Cancel iff status is `pending` or `queued`; otherwise `NotFound`.
    async fn cancel_pending(&self, id: &NotificationId) -> Result<()>;

    /// Cancel every pending/queued row of the batch; returns affected count.
    async fn cancel_pending_by_batch(&self, batch_id: &BatchId) -> Result<u64>;

    /// Durable fallback for the idempotency check.
    async fn exists_by_idempotency_key(&self, key: &str) -> Result<bool>;
}

/// Durable storage for batches.
#[async_trait]
pub trait BatchRepository: Send + Sync {
    async fn create(&self, batch: &Batch) -> Result<()>;
    async fn get_by_id(&self, id: &BatchId) -> Result<Batch>;
}

/// Append-only journal of delivery attempts.
#[async_trait]
pub trait DeliveryAttemptRepository: Send + Sync {
    async fn create(&self, attempt: &DeliveryAttempt) -> Result<()>;
}
