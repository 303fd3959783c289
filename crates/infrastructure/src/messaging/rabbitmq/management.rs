//! RabbitMQ management API client (queue depth readout for `/metrics`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use courier_domain::{DomainError, Result};

use super::topology::{DLQ_QUEUES, MAIN_QUEUES};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin client over the management HTTP API.
#[derive(Clone)]
pub struct ManagementClient {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct QueueStats {
    #[serde(default)]
    messages: i64,
    #[serde(default)]
    messages_ready: i64,
    #[serde(default)]
    messages_unacknowledged: i64,
}

/// Depth snapshot of one queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueDepth {
    pub queue: String,
    pub depth: i64,
    pub ready: i64,
    pub unacked: i64,
}

impl ManagementClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn queue_stats(&self, vhost: &str, queue: &str) -> Result<QueueStats> {
        let vhost = if vhost == "/" { "%2F" } else { vhost };
        let url = format!("{}/api/queues/{}/{}", self.base_url, vhost, queue);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DomainError::infrastructure(format!("management api request: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::infrastructure(format!(
                "management api: status {} for queue {queue}",
                response.status()
            )));
        }

        response
            .json::<QueueStats>()
            .await
            .map_err(|e| DomainError::infrastructure(format!("management api decode: {e}")))
    }

    /// Depths of the three main queues and their DLQs.
    ///
    /// A queue whose stats can't be fetched reports depth -1 rather than
    /// failing the whole readout.
    pub async fn queue_depths(&self) -> Vec<QueueDepth> {
        let queues = MAIN_QUEUES.iter().chain(DLQ_QUEUES.iter());

        let mut depths = Vec::new();
        for (queue, _) in queues {
            match self.queue_stats("/", queue).await {
                Ok(stats) => depths.push(QueueDepth {
                    queue: queue.to_string(),
                    depth: stats.messages,
                    ready: stats.messages_ready,
                    unacked: stats.messages_unacknowledged,
                }),
                Err(e) => {
                    tracing::warn!(queue, error = %e, "queue stats unavailable");
                    depths.push(QueueDepth {
                        queue: queue.to_string(),
                        depth: -1,
                        ready: 0,
                        unacked: 0,
                    });
                }
            }
        }
        depths
    }
}
