use async_trait::async_trait;

use courier_domain::{Channel, Result};

/// Per-channel send rate limiter.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns `true` when the channel is under its limit for the current
    /// window. The atomic increment is the linearization point; callers
    /// need no locking.
    async fn allow(&self, channel: Channel) -> Result<bool>;
}
