//! Notification status counts for the metrics endpoint.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use courier_application::ports::{MetricsProvider, NotificationStats};
use courier_domain::{DomainError, Result};

#[derive(Clone)]
pub struct PostgresMetricsRepository {
    pool: PgPool,
}

impl PostgresMetricsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetricsProvider for PostgresMetricsRepository {
    async fn notification_stats(&self) -> Result<NotificationStats> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM notifications \
             WHERE deleted_at IS NULL GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::infrastructure(format!("failed to load stats: {e}")))?;

        let mut stats = NotificationStats::default();
        for row in rows {
            let status: String = row.get("status");
            let count: i64 = row.get("count");
            match status.as_str() {
                "pending" => stats.pending = count,
                "queued" => stats.queued = count,
                "sent" => stats.sent = count,
                "failed" => stats.failed = count,
                _ => {}
            }
            stats.total += count;
        }
        Ok(stats)
    }
}
