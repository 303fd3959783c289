use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;

use courier_application::ports::RateLimiter;
use courier_domain::{Channel, DomainError, Result};

const MAX_PER_SECOND: i64 = 100;
const KEY_PREFIX: &str = "ratelimit:channel:";
/// Window keys outlive their second by one more so late readers still see
/// them; Redis reclaims them right after.
const WINDOW_TTL_SECONDS: i64 = 2;

/// Fixed-window per-channel rate limiter (max 100/s).
///
/// Keyed by `ratelimit:channel:<channel>:<unix_second>`; the atomic INCR is
/// the linearization point, so concurrent workers need no coordination.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: ConnectionManager,
}

impl RedisRateLimiter {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn allow(&self, channel: Channel) -> Result<bool> {
        let window_key = format!("{KEY_PREFIX}{}:{}", channel, Utc::now().timestamp());
        let mut conn = self.conn.clone();

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&window_key)
            .cmd("EXPIRE")
            .arg(&window_key)
            .arg(WINDOW_TTL_SECONDS)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::infrastructure(format!("redis rate limit: {e}")))?;

        Ok(count <= MAX_PER_SECOND)
    }
}
