//! PostgreSQL delivery attempt journal.

use async_trait::async_trait;
use sqlx::PgPool;

use courier_application::ports::DeliveryAttemptRepository;
use courier_domain::{DeliveryAttempt, DomainError, Result};

#[derive(Clone)]
pub struct PostgresDeliveryAttemptRepository {
    pool: PgPool,
}

impl PostgresDeliveryAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryAttemptRepository for PostgresDeliveryAttemptRepository {
    async fn create(&self, attempt: &DeliveryAttempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delivery_attempts
                (id, notification_id, attempt_number, success, status_code,
                 response_body, error_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(attempt.id.0)
        .bind(attempt.notification_id.0)
        .bind(attempt.attempt_number as i32)
        .bind(attempt.success)
        .bind(attempt.status_code as i32)
        .bind(&attempt.response_body)
        .bind(&attempt.error_message)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::infrastructure(format!("failed to insert delivery attempt: {e}"))
        })?;
        Ok(())
    }
}
