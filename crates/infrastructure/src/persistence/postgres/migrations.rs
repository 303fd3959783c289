//! Idempotent schema setup, run at startup by both binaries.

use sqlx::PgPool;

use courier_domain::{DomainError, Result};

/// Create the three tables and their indexes if they do not exist yet.
///
/// The idempotency uniqueness constraints are partial indexes over live
/// rows with a non-null key; they are the last line of defense behind the
/// Redis set-if-absent check.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS batches (
            id UUID PRIMARY KEY,
            idempotency_key TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            deleted_at TIMESTAMPTZ
        );
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_batches_idempotency_key
            ON batches(idempotency_key)
            WHERE idempotency_key IS NOT NULL AND deleted_at IS NULL;
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY,
            batch_id UUID,
            recipient TEXT NOT NULL,
            channel VARCHAR(16) NOT NULL,
            content TEXT NOT NULL,
            priority VARCHAR(16) NOT NULL,
            status VARCHAR(16) NOT NULL,
            idempotency_key TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            sent_at TIMESTAMPTZ,
            failure_reason TEXT,
            deleted_at TIMESTAMPTZ
        );
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_notifications_idempotency_key
            ON notifications(idempotency_key)
            WHERE idempotency_key IS NOT NULL AND deleted_at IS NULL;
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_notifications_batch_id
            ON notifications(batch_id);
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_notifications_created_at
            ON notifications(created_at);
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS delivery_attempts (
            id UUID PRIMARY KEY,
            notification_id UUID NOT NULL,
            attempt_number INTEGER NOT NULL,
            success BOOLEAN NOT NULL,
            status_code INTEGER NOT NULL,
            response_body TEXT NOT NULL DEFAULT '',
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            deleted_at TIMESTAMPTZ
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_delivery_attempts_notification_id
            ON delivery_attempts(notification_id);
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DomainError::infrastructure(format!("failed to run migration: {e}")))?;
    }

    Ok(())
}
