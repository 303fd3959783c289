//! Reconnecting, panic-isolated queue consumers.
//!
//! One supervised loop per main queue:
//! `connect -> consume until error -> classify -> backoff or exit`.
//! A handler panic unwinds the current loop, is caught at the restart
//! layer, and the unacked message is redelivered by the broker.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Connection, ConnectionProperties};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use courier_application::ports::NotificationEvent;
use courier_domain::Result;

use super::topology::{declare_topology, MAIN_QUEUES};

/// Unacked messages in flight per queue loop.
const PREFETCH_COUNT: u16 = 10;
/// Deadline for one handler invocation.
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(60);
/// Broker redeliveries before a failing message is dead-lettered.
const MAX_REDELIVERIES: i64 = 3;

const INITIAL_RECONNECT_BACKOFF: Duration = Duration::from_secs(1);
const MAX_RECONNECT_BACKOFF: Duration = Duration::from_secs(30);

/// Handles one decoded notification event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: NotificationEvent) -> Result<()>;
}

/// Consumes the three per-channel queues until the token is cancelled.
///
/// The connection is shared by all queue loops and swapped under a mutex on
/// reconnect; each loop opens its own channel.
#[derive(Clone)]
pub struct RabbitMqConsumer {
    conn: Arc<Mutex<Connection>>,
    url: String,
}

impl RabbitMqConsumer {
    /// Dial the broker and declare the topology.
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = dial(url).await?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            url: url.to_string(),
        })
    }

    /// Run one consumer loop per main queue; returns when every loop has
    /// observed the cancellation.
    pub async fn run(&self, handler: Arc<dyn EventHandler>, token: CancellationToken) {
        let mut tasks = Vec::new();
        for (queue, _) in MAIN_QUEUES {
            let consumer = self.clone();
            let handler = handler.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                consumer.consume_with_restart(queue, handler, token).await;
            }));
        }
        for task in tasks {
            let _ = task.await;
        }
    }

    async fn consume_with_restart(
        &self,
        queue: &'static str,
        handler: Arc<dyn EventHandler>,
        token: CancellationToken,
    ) {
        let mut backoff = INITIAL_RECONNECT_BACKOFF;

        loop {
            if token.is_cancelled() {
                info!(queue, "consumer shutting down");
                return;
            }

            // The handler runs inside this future; a panic anywhere in the
            // loop is confined here and treated like a connection failure.
            let outcome = AssertUnwindSafe(self.consume_queue(queue, &handler, &token))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(queue, error = %e, "consumer loop ended"),
                Err(panic) => {
                    error!(queue, panic = %panic_message(panic.as_ref()), "consumer panic recovered")
                }
            }

            if token.is_cancelled() {
                info!(queue, "consumer stopped");
                return;
            }

            info!(queue, backoff_ms = backoff.as_millis() as u64, "reconnecting after backoff");
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(backoff) => {}
            }

            match self.reconnect().await {
                Ok(()) => {
                    info!(queue, "reconnected, resuming consumption");
                    backoff = INITIAL_RECONNECT_BACKOFF;
                }
                Err(e) => {
                    warn!(queue, error = %e, "reconnect failed");
                    backoff = next_backoff(backoff);
                }
            }
        }
    }

    async fn consume_queue(
        &self,
        queue: &str,
        handler: &Arc<dyn EventHandler>,
        token: &CancellationToken,
    ) -> std::result::Result<(), lapin::Error> {
        let channel = {
            let conn = self.conn.lock().await;
            conn.create_channel().await?
        };
        channel
            .basic_qos(PREFETCH_COUNT, BasicQosOptions::default())
            .await?;

        let mut deliveries = channel
            .basic_consume(
                queue,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(queue, "consumer started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(queue, "consumer loop cancelled");
                    return Ok(());
                }
                next = deliveries.next() => {
                    match next {
                        Some(Ok(delivery)) => {
                            handle_delivery(delivery, queue, handler.as_ref(), token).await;
                        }
                        Some(Err(e)) => return Err(e),
                        None => {
                            // Stream closed under us: reconnect path.
                            warn!(queue, "delivery stream closed");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Swap in a fresh connection under the mutex; skips dialing when a
    /// sibling loop already restored it.
    async fn reconnect(&self) -> std::result::Result<(), lapin::Error> {
        let mut guard = self.conn.lock().await;
        if guard.status().connected() {
            return Ok(());
        }

        let conn = Connection::connect(&self.url, ConnectionProperties::default()).await?;
        let channel = conn.create_channel().await?;
        declare_topology(&channel).await?;
        let _ = channel.close(200, "topology declared").await;

        *guard = conn;
        info!("rabbitmq consumer reconnected");
        Ok(())
    }
}

async fn dial(url: &str) -> Result<Connection> {
    let conn = Connection::connect(url, ConnectionProperties::default())
        .await
        .map_err(|e| courier_domain::DomainError::infrastructure(format!("rabbitmq dial: {e}")))?;
    let channel = conn.create_channel().await.map_err(|e| {
        courier_domain::DomainError::infrastructure(format!("rabbitmq channel: {e}"))
    })?;
    declare_topology(&channel).await.map_err(|e| {
        courier_domain::DomainError::infrastructure(format!("rabbitmq topology: {e}"))
    })?;
    let _ = channel.close(200, "topology declared").await;
    Ok(conn)
}

async fn handle_delivery(
    delivery: Delivery,
    queue: &str,
    handler: &dyn EventHandler,
    token: &CancellationToken,
) {
    let event: NotificationEvent = match serde_json::from_slice(&delivery.data) {
        Ok(event) => event,
        Err(e) => {
            // Unparseable payloads go straight to the DLQ.
            warn!(queue, error = %e, "unparseable payload, dead-lettering");
            nack(&delivery, false).await;
            return;
        }
    };

    let redeliveries = delivery
        .properties
        .headers()
        .as_ref()
        .map(death_count)
        .unwrap_or(0);
    let notification_id = event.notification_id;

    let outcome = tokio::select! {
        // Shutdown mid-message: leave it unacked for redelivery on next boot.
        _ = token.cancelled() => return,
        outcome = tokio::time::timeout(MESSAGE_TIMEOUT, handler.handle(event)) => outcome,
    };

    match outcome {
        Ok(Ok(())) => {
            if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                warn!(queue, %notification_id, error = %e, "failed to ack");
            }
        }
        Ok(Err(e)) => {
            warn!(
                queue,
                %notification_id,
                error = %e,
                attempt = redeliveries + 1,
                max_retries = MAX_REDELIVERIES,
                "handler failed"
            );
            nack(&delivery, redeliveries < MAX_REDELIVERIES).await;
        }
        Err(_) => {
            warn!(queue, %notification_id, timeout_s = MESSAGE_TIMEOUT.as_secs(), "handler timed out");
            nack(&delivery, redeliveries < MAX_REDELIVERIES).await;
        }
    }
}

async fn nack(delivery: &Delivery, requeue: bool) {
    let options = BasicNackOptions {
        requeue,
        ..Default::default()
    };
    if let Err(e) = delivery.nack(options).await {
        warn!(error = %e, "failed to nack");
    }
}

/// Redelivery count from the broker's death-header chain. Every main queue
/// has a DLX, so rejected deliveries accumulate `x-death` entries; the
/// first entry tracks the current queue.
fn death_count(headers: &FieldTable) -> i64 {
    let Some(AMQPValue::FieldArray(deaths)) = headers.inner().get("x-death") else {
        return 0;
    };
    match deaths.as_slice().first() {
        Some(AMQPValue::FieldTable(death)) => match death.inner().get("count") {
            Some(AMQPValue::LongLongInt(count)) => *count,
            _ => 0,
        },
        _ => 0,
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_RECONNECT_BACKOFF)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapin::types::FieldArray;

    fn death_headers(count: i64) -> FieldTable {
        let mut death = FieldTable::default();
        death.insert("count".into(), AMQPValue::LongLongInt(count));
        death.insert("queue".into(), AMQPValue::LongString("notifications.sms".into()));

        let mut headers = FieldTable::default();
        headers.insert(
            "x-death".into(),
            AMQPValue::FieldArray(FieldArray::from(vec![AMQPValue::FieldTable(death)])),
        );
        headers
    }

    #[test]
    fn death_count_reads_first_entry() {
        assert_eq!(death_count(&death_headers(0)), 0);
        assert_eq!(death_count(&death_headers(2)), 2);
        assert_eq!(death_count(&death_headers(7)), 7);
    }

    #[test]
    fn death_count_defaults_to_zero() {
        assert_eq!(death_count(&FieldTable::default()), 0);

        let mut malformed = FieldTable::default();
        malformed.insert("x-death".into(), AMQPValue::LongString("oops".into()));
        assert_eq!(death_count(&malformed), 0);

        let mut empty_chain = FieldTable::default();
        empty_chain.insert(
            "x-death".into(),
            AMQPValue::FieldArray(FieldArray::from(Vec::<AMQPValue>::new())),
        );
        assert_eq!(death_count(&empty_chain), 0);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut backoff = INITIAL_RECONNECT_BACKOFF;
        backoff = next_backoff(backoff);
        assert_eq!(backoff, Duration::from_secs(2));
        backoff = next_backoff(backoff);
        assert_eq!(backoff, Duration::from_secs(4));
        for _ in 0..10 {
            backoff = next_backoff(backoff);
        }
        assert_eq!(backoff, MAX_RECONNECT_BACKOFF);
    }
}
