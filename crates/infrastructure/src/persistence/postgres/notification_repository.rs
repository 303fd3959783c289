//! PostgreSQL notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};

use courier_application::ports::{ListFilter, ListResult, NotificationRepository};
use courier_domain::{
    BatchId, Channel, DomainError, Notification, NotificationId, Priority, Result, Status,
};

/// Bulk inserts are chunked to stay clear of the bind parameter limit.
const INSERT_CHUNK_SIZE: usize = 100;

const SELECT_COLUMNS: &str = "id, batch_id, recipient, channel, content, priority, status, \
     idempotency_key, created_at, updated_at, sent_at, failure_reason";

#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, batch_id, recipient, channel, content, priority, status,
                 idempotency_key, created_at, updated_at, sent_at, failure_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(notification.id.0)
        .bind(notification.batch_id.map(|b| b.0))
        .bind(&notification.recipient)
        .bind(notification.channel.as_str())
        .bind(&notification.content)
        .bind(notification.priority.as_str())
        .bind(notification.status.as_str())
        .bind(&notification.idempotency_key)
        .bind(notification.created_at)
        .bind(notification.updated_at)
        .bind(notification.sent_at)
        .bind(&notification.failure_reason)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn create_batch(&self, notifications: &[Notification]) -> Result<()> {
        if notifications.is_empty() {
            return Ok(());
        }

        for chunk in notifications.chunks(INSERT_CHUNK_SIZE) {
            let mut builder = QueryBuilder::new(
                "INSERT INTO notifications \
                 (id, batch_id, recipient, channel, content, priority, status, \
                  idempotency_key, created_at, updated_at, sent_at, failure_reason) ",
            );
            builder.push_values(chunk, |mut row, n| {
                row.push_bind(n.id.0)
                    .push_bind(n.batch_id.map(|b| b.0))
                    .push_bind(&n.recipient)
                    .push_bind(n.channel.as_str())
                    .push_bind(&n.content)
                    .push_bind(n.priority.as_str())
                    .push_bind(n.status.as_str())
                    .push_bind(&n.idempotency_key)
                    .push_bind(n.created_at)
                    .push_bind(n.updated_at)
                    .push_bind(n.sent_at)
                    .push_bind(&n.failure_reason);
            });

            builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(map_insert_error)?;
        }

        Ok(())
    }

    async fn get_by_id(&self, id: &NotificationId) -> Result<Notification> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM notifications WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::infrastructure(format!("failed to load notification: {e}")))?;

        match row {
            Some(row) => map_row_to_notification(row),
            None => Err(DomainError::NotFound),
        }
    }

    async fn get_by_batch_id(&self, batch_id: &BatchId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM notifications \
             WHERE batch_id = $1 AND deleted_at IS NULL ORDER BY created_at"
        ))
        .bind(batch_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::infrastructure(format!("failed to load batch notifications: {e}"))
        })?;

        rows.into_iter().map(map_row_to_notification).collect()
    }

    async fn update_status(
        &self,
        id: &NotificationId,
        status: Status,
        sent_at: Option<DateTime<Utc>>,
        failure_reason: Option<String>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $2,
                updated_at = NOW(),
                sent_at = COALESCE($3, sent_at),
                failure_reason = COALESCE($4, failure_reason)
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.0)
        .bind(status.as_str())
        .bind(sent_at)
        .bind(failure_reason)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::infrastructure(format!("failed to update status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &ListFilter) -> Result<ListResult> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM notifications WHERE deleted_at IS NULL");
        push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::infrastructure(format!("failed to count notifications: {e}")))?
            .get(0);

        let mut builder = QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM notifications WHERE deleted_at IS NULL"
        ));
        push_filters(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::infrastructure(format!("failed to list notifications: {e}")))?;

        let notifications = rows
            .into_iter()
            .map(map_row_to_notification)
            .collect::<Result<Vec<_>>>()?;

        Ok(ListResult {
            notifications,
            total,
        })
    }

    async fn cancel_pending(&self, id: &NotificationId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1
              AND status IN ('pending', 'queued')
              AND deleted_at IS NULL
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::infrastructure(format!("failed to cancel notification: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn cancel_pending_by_batch(&self, batch_id: &BatchId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'cancelled', updated_at = NOW()
            WHERE batch_id = $1
              AND status IN ('pending', 'queued')
              AND deleted_at IS NULL
            "#,
        )
        .bind(batch_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::infrastructure(format!("failed to cancel batch: {e}")))?;

        Ok(result.rows_affected())
    }

    async fn exists_by_idempotency_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM notifications \
             WHERE idempotency_key = $1 AND deleted_at IS NULL LIMIT 1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::infrastructure(format!("failed to check idempotency key: {e}"))
        })?;

        Ok(row.is_some())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ListFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(channel) = filter.channel {
        builder.push(" AND channel = ").push_bind(channel.as_str());
    }
    if let Some(from) = filter.from_time {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to_time {
        builder.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(batch_id) = filter.batch_id {
        builder.push(" AND batch_id = ").push_bind(batch_id.0);
    }
}

/// Unique violations on the idempotency index surface as duplicates.
fn map_insert_error(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return DomainError::DuplicateRequest;
        }
    }
    DomainError::infrastructure(format!("failed to insert notification: {e}"))
}

fn map_row_to_notification(row: PgRow) -> Result<Notification> {
    let channel_raw: String = row.get("channel");
    let priority_raw: String = row.get("priority");
    let status_raw: String = row.get("status");

    let channel = Channel::parse(&channel_raw)
        .ok_or_else(|| DomainError::infrastructure(format!("unknown channel: {channel_raw}")))?;
    let priority = Priority::parse(&priority_raw)
        .ok_or_else(|| DomainError::infrastructure(format!("unknown priority: {priority_raw}")))?;
    let status = Status::parse(&status_raw)
        .ok_or_else(|| DomainError::infrastructure(format!("unknown status: {status_raw}")))?;

    Ok(Notification {
        id: NotificationId(row.get("id")),
        batch_id: row
            .get::<Option<uuid::Uuid>, _>("batch_id")
            .map(BatchId),
        recipient: row.get("recipient"),
        channel,
        content: row.get("content"),
        priority,
        status,
        idempotency_key: row.get("idempotency_key"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        sent_at: row.get("sent_at"),
        failure_reason: row.get("failure_reason"),
    })
}
