//! PostgreSQL batch repository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use courier_application::ports::BatchRepository;
use courier_domain::{Batch, BatchId, DomainError, Result};

#[derive(Clone)]
pub struct PostgresBatchRepository {
    pool: PgPool,
}

impl PostgresBatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchRepository for PostgresBatchRepository {
    async fn create(&self, batch: &Batch) -> Result<()> {
        sqlx::query("INSERT INTO batches (id, idempotency_key, created_at) VALUES ($1, $2, $3)")
            .bind(batch.id.0)
            .bind(&batch.idempotency_key)
            .bind(batch.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.is_unique_violation() {
                        return DomainError::DuplicateRequest;
                    }
                }
                DomainError::infrastructure(format!("failed to insert batch: {e}"))
            })?;
        Ok(())
    }

    async fn get_by_id(&self, id: &BatchId) -> Result<Batch> {
        let row = sqlx::query(
            "SELECT id, idempotency_key, created_at FROM batches \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::infrastructure(format!("failed to load batch: {e}")))?;

        match row {
            Some(row) => Ok(Batch {
                id: BatchId(row.get("id")),
                idempotency_key: row.get("idempotency_key"),
                created_at: row.get("created_at"),
            }),
            None => Err(DomainError::NotFound),
        }
    }
}
