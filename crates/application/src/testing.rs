//! In-memory port implementations - TEST ONLY
//!
//! Fast, isolated substitutes for the production adapters. They back the
//! use-case unit tests and the HTTP router tests; do NOT wire them into
//! production binaries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use courier_domain::{
    Batch, BatchId, DeliveryAttempt, DomainError, Notification, NotificationId, Result, Status,
};

use crate::ports::{
    BatchRepository, DeliveryAttemptRepository, DeliveryClient, DeliveryError, DeliveryRequest,
    DeliveryResponse, EventPublisher, IdempotencyStore, ListFilter, ListResult, MetricsProvider,
    NotificationEvent, NotificationRepository, NotificationStats, RateLimiter,
};

/// In-memory notification repository.
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    rows: RwLock<HashMap<NotificationId, Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<()> {
        let mut rows = self.rows.write().await;
        // Mirror the database's partial unique index on idempotency_key.
        if let Some(key) = &notification.idempotency_key {
            if rows.values().any(|n| n.idempotency_key.as_ref() == Some(key)) {
                return Err(DomainError::DuplicateRequest);
            }
        }
        rows.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn create_batch(&self, notifications: &[Notification]) -> Result<()> {
        let mut rows = self.rows.write().await;
        for n in notifications {
            rows.insert(n.id, n.clone());
        }
        Ok(())
    }

    async fn get_by_id(&self, id: &NotificationId) -> Result<Notification> {
        self.rows
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    async fn get_by_batch_id(&self, batch_id: &BatchId) -> Result<Vec<Notification>> {
        let rows = self.rows.read().await;
        let mut out: Vec<Notification> = rows
            .values()
            .filter(|n| n.batch_id.as_ref() == Some(batch_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    async fn update_status(
        &self,
        id: &NotificationId,
        status: Status,
        sent_at: Option<DateTime<Utc>>,
        failure_reason: Option<String>,
    ) -> Result<()> {
        let mut rows = self.rows.write().await;
        let n = rows.get_mut(id).ok_or(DomainError::NotFound)?;
        n.status = status;
        n.updated_at = Utc::now();
        if sent_at.is_some() {
            n.sent_at = sent_at;
        }
        if failure_reason.is_some() {
            n.failure_reason = failure_reason;
        }
        Ok(())
    }

    async fn list(&self, filter: &ListFilter) -> Result<ListResult> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Notification> = rows
            .values()
            .filter(|n| filter.status.map_or(true, |s| n.status == s))
            .filter(|n| filter.channel.map_or(true, |c| n.channel == c))
            .filter(|n| filter.from_time.map_or(true, |t| n.created_at >= t))
            .filter(|n| filter.to_time.map_or(true, |t| n.created_at <= t))
            .filter(|n| filter.batch_id.map_or(true, |b| n.batch_id == Some(b)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok(ListResult {
            notifications: page,
            total,
        })
    }

    async fn cancel_pending(&self, id: &NotificationId) -> Result<()> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(id) {
            Some(n) if matches!(n.status, Status::Pending | Status::Queued) => {
                n.status = Status::Cancelled;
                n.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DomainError::NotFound),
        }
    }

    async fn cancel_pending_by_batch(&self, batch_id: &BatchId) -> Result<u64> {
        let mut rows = self.rows.write().await;
        let mut cancelled = 0u64;
        for n in rows.values_mut() {
            if n.batch_id.as_ref() == Some(batch_id)
                && matches!(n.status, Status::Pending | Status::Queued)
            {
                n.status = Status::Cancelled;
                n.updated_at = Utc::now();
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn exists_by_idempotency_key(&self, key: &str) -> Result<bool> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .any(|n| n.idempotency_key.as_deref() == Some(key)))
    }
}

#[async_trait]
impl MetricsProvider for InMemoryNotificationRepository {
    async fn notification_stats(&self) -> Result<NotificationStats> {
        let rows = self.rows.read().await;
        let mut stats = NotificationStats::default();
        for n in rows.values() {
            match n.status {
                Status::Pending => stats.pending += 1,
                Status::Queued => stats.queued += 1,
                Status::Sent => stats.sent += 1,
                Status::Failed => stats.failed += 1,
                Status::Cancelled => {}
            }
            stats.total += 1;
        }
        Ok(stats)
    }
}

/// In-memory batch repository.
#[derive(Default)]
pub struct InMemoryBatchRepository {
    rows: RwLock<HashMap<BatchId, Batch>>,
}

impl InMemoryBatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchRepository for InMemoryBatchRepository {
    async fn create(&self, batch: &Batch) -> Result<()> {
        self.rows.write().await.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &BatchId) -> Result<Batch> {
        self.rows
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }
}

/// In-memory delivery attempt journal.
#[derive(Default)]
pub struct InMemoryAttemptRepository {
    rows: Mutex<Vec<DeliveryAttempt>>,
    fail_writes: bool,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal whose writes always fail, for loss-tolerance tests.
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    pub fn for_notification(&self, id: &NotificationId) -> Vec<DeliveryAttempt> {
        self.rows
            .lock()
            .expect("attempt journal lock")
            .iter()
            .filter(|a| a.notification_id == *id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeliveryAttemptRepository for InMemoryAttemptRepository {
    async fn create(&self, attempt: &DeliveryAttempt) -> Result<()> {
        if self.fail_writes {
            return Err(DomainError::infrastructure("attempt journal unavailable"));
        }
        self.rows
            .lock()
            .expect("attempt journal lock")
            .push(attempt.clone());
        Ok(())
    }
}

/// In-memory set-if-absent store. TTLs are accepted and ignored.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    keys: Mutex<std::collections::HashSet<String>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn set_if_absent(&self, key: &str, _ttl: Duration) -> Result<bool> {
        Ok(self
            .keys
            .lock()
            .expect("idempotency lock")
            .insert(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.keys.lock().expect("idempotency lock").contains(key))
    }
}

/// Idempotency store that errors on every call, simulating an outage.
pub struct FlakyIdempotencyStore;

impl FlakyIdempotencyStore {
    pub fn always_failing() -> Self {
        Self
    }
}

#[async_trait]
impl IdempotencyStore for FlakyIdempotencyStore {
    async fn set_if_absent(&self, _key: &str, _ttl: Duration) -> Result<bool> {
        Err(DomainError::infrastructure("idempotency store unreachable"))
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Err(DomainError::infrastructure("idempotency store unreachable"))
    }
}

/// Publisher that records events and can fail on demand.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<NotificationEvent>>,
    fail_next: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.published.lock().expect("publisher lock").clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &NotificationEvent) -> Result<()> {
        if self.fail_next.load(Ordering::SeqCst) {
            return Err(DomainError::infrastructure("broker unavailable"));
        }
        self.published
            .lock()
            .expect("publisher lock")
            .push(event.clone());
        Ok(())
    }

    async fn publish_batch(&self, events: &[NotificationEvent]) -> Result<()> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

/// Rate limiter with a fixed verdict.
pub struct StaticRateLimiter {
    allow: bool,
}

impl StaticRateLimiter {
    pub fn allowing() -> Self {
        Self { allow: true }
    }

    pub fn denying() -> Self {
        Self { allow: false }
    }
}

#[async_trait]
impl RateLimiter for StaticRateLimiter {
    async fn allow(&self, _channel: courier_domain::Channel) -> Result<bool> {
        Ok(self.allow)
    }
}

/// Delivery client following a scripted list of outcomes, then succeeding.
///
/// `Ok(code)` yields a default response with that status code; `Err` yields
/// the scripted failure.
pub struct ScriptedDeliveryClient {
    outcomes: Mutex<std::collections::VecDeque<std::result::Result<u16, DeliveryError>>>,
    repeat_failure: Option<DeliveryError>,
    calls: AtomicUsize,
}

impl ScriptedDeliveryClient {
    pub fn always_succeeding() -> Self {
        Self::with_outcomes(Vec::new())
    }

    pub fn always_failing(status_code: u16, message: &str) -> Self {
        Self {
            outcomes: Mutex::new(std::collections::VecDeque::new()),
            repeat_failure: Some(DeliveryError {
                status_code,
                message: message.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_outcomes(outcomes: Vec<std::result::Result<u16, DeliveryError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            repeat_failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryClient for ScriptedDeliveryClient {
    async fn deliver(
        &self,
        _request: &DeliveryRequest,
    ) -> std::result::Result<(DeliveryResponse, u16), DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.repeat_failure {
            return Err(failure.clone());
        }
        let next = self.outcomes.lock().expect("outcomes lock").pop_front();
        match next {
            Some(Err(e)) => Err(e),
            Some(Ok(code)) => Ok((default_response(), code)),
            None => Ok((default_response(), 202)),
        }
    }
}

fn default_response() -> DeliveryResponse {
    DeliveryResponse {
        message_id: "test-msg-id".to_string(),
        status: "accepted".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }
}
