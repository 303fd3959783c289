//! Dependency health probe backing `GET /health`.

use redis::aio::ConnectionManager;
use sqlx::PgPool;

/// Pings PostgreSQL and Redis.
#[derive(Clone)]
pub struct DependencyProbe {
    pool: PgPool,
    redis: ConnectionManager,
}

impl DependencyProbe {
    pub fn new(pool: PgPool, redis: ConnectionManager) -> Self {
        Self { pool, redis }
    }

    /// True when every dependency answers.
    pub async fn healthy(&self) -> bool {
        if sqlx::query("SELECT 1").execute(&self.pool).await.is_err() {
            return false;
        }

        let mut conn = self.redis.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }
}
