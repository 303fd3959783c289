use std::time::Duration;

use async_trait::async_trait;

use courier_domain::Result;

/// Fast set-if-absent store used for admission dedupe.
///
/// The store is advisory: when it is unreachable the admission path falls
/// back to a durable existence check, with the database unique index as the
/// last line of defense.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Atomically record `key` with the given TTL.
    /// Returns `true` when the key was absent and is now set.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;
}
