use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use courier_application::ports::IdempotencyStore;
use courier_domain::{DomainError, Result};

const KEY_PREFIX: &str = "idempotency:";
const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Redis-backed set-if-absent store for admission dedupe.
#[derive(Clone)]
pub struct RedisIdempotencyStore {
    conn: ConnectionManager,
}

impl RedisIdempotencyStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool> {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        let mut conn = self.conn.clone();

        // SET NX EX is the atomic set-if-absent; a nil reply means the key
        // was already present.
        let reply: Option<String> = redis::cmd("SET")
            .arg(format!("{KEY_PREFIX}{key}"))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::infrastructure(format!("redis set-if-absent: {e}")))?;

        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let count: i64 = redis::cmd("EXISTS")
            .arg(format!("{KEY_PREFIX}{key}"))
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::infrastructure(format!("redis exists: {e}")))?;
        Ok(count > 0)
    }
}
