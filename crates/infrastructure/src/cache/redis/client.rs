use redis::aio::ConnectionManager;
use redis::Client;

use courier_domain::{DomainError, Result};

/// Open a Redis connection manager and verify the server responds.
///
/// The manager multiplexes over one connection and reconnects internally;
/// clones share it, so both adapters hold cheap copies.
pub async fn connect(url: &str) -> Result<ConnectionManager> {
    let client = Client::open(url)
        .map_err(|e| DomainError::infrastructure(format!("redis client: {e}")))?;
    let mut manager = ConnectionManager::new(client)
        .await
        .map_err(|e| DomainError::infrastructure(format!("redis connect: {e}")))?;

    let pong: String = redis::cmd("PING")
        .query_async(&mut manager)
        .await
        .map_err(|e| DomainError::infrastructure(format!("redis ping: {e}")))?;
    tracing::debug!(%pong, "redis connection established");

    Ok(manager)
}
