use async_trait::async_trait;
use serde::Serialize;

use courier_domain::Result;

/// Notification row counts per status.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NotificationStats {
    pub pending: i64,
    pub queued: i64,
    pub sent: i64,
    pub failed: i64,
    pub total: i64,
}

/// Read-side metrics for the `/metrics` endpoint.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn notification_stats(&self) -> Result<NotificationStats>;
}
