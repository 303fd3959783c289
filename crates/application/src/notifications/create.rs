//! Admission: validate, dedupe, persist pending, publish, mark queued.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use courier_domain::notification::rules::{self, MAX_BATCH_SIZE};
use courier_domain::{Batch, Channel, DomainError, Notification, Priority, Result, Status};

use crate::ports::{
    BatchRepository, EventPublisher, IdempotencyStore, NotificationEvent, NotificationRepository,
};

/// Idempotency keys are remembered for seven days.
const IDEMPOTENCY_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Command for admitting a single notification.
#[derive(Debug, Clone)]
pub struct CreateCommand {
    pub recipient: String,
    pub channel: String,
    /// Absent priority defaults to `normal`.
    pub priority: Option<String>,
    pub content: String,
    pub idempotency_key: Option<String>,
}

/// One item of a batch command.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub recipient: String,
    pub channel: String,
    pub priority: Option<String>,
    pub content: String,
}

/// Command for admitting a batch (1..=1000 items).
#[derive(Debug, Clone)]
pub struct CreateBatchCommand {
    pub items: Vec<BatchItem>,
    pub idempotency_key: Option<String>,
}

/// Result of a single admission.
///
/// When the broker publish fails the notification has still been persisted
/// (status `pending`) and the error rides along so the caller can surface
/// it; an out-of-band re-publish is the recovery path.
#[derive(Debug)]
pub struct CreatedNotification {
    pub notification: Notification,
    pub publish_error: Option<DomainError>,
}

/// Result of a batch admission.
#[derive(Debug)]
pub struct CreatedBatch {
    pub batch: Batch,
    pub notifications: Vec<Notification>,
    /// Items dropped by first-pass validation.
    pub skipped: usize,
    pub publish_error: Option<DomainError>,
}

/// Use case: admit notifications (single and batch).
pub struct CreateNotificationUseCase {
    repo: Arc<dyn NotificationRepository>,
    batches: Arc<dyn BatchRepository>,
    publisher: Arc<dyn EventPublisher>,
    idempotency: Arc<dyn IdempotencyStore>,
}

impl CreateNotificationUseCase {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        batches: Arc<dyn BatchRepository>,
        publisher: Arc<dyn EventPublisher>,
        idempotency: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            repo,
            batches,
            publisher,
            idempotency,
        }
    }

    /// Admit one notification.
    pub async fn execute(&self, cmd: CreateCommand) -> Result<CreatedNotification> {
        let channel = Channel::parse(&cmd.channel).ok_or_else(|| {
            warn!(channel = %cmd.channel, "invalid channel");
            DomainError::InvalidChannel {
                value: cmd.channel.clone(),
            }
        })?;
        let priority = parse_priority(cmd.priority.as_deref())?;
        rules::validate_content(channel, &cmd.content)?;
        rules::validate_recipient(&cmd.recipient)?;

        if let Some(key) = cmd.idempotency_key.as_deref().filter(|k| !k.is_empty()) {
            self.check_idempotency(key).await?;
        }

        let notification = Notification::new(
            cmd.recipient,
            channel,
            cmd.content,
            priority,
            cmd.idempotency_key,
        );

        self.repo.create(&notification).await?;
        info!(
            notification_id = %notification.id,
            channel = %channel,
            priority = %priority,
            "notification created"
        );

        let event = event_for(&notification);
        if let Err(e) = self.publisher.publish(&event).await {
            error!(
                notification_id = %notification.id,
                error = %e,
                "failed to publish notification event"
            );
            return Ok(CreatedNotification {
                notification,
                publish_error: Some(e),
            });
        }

        let notification = self.mark_queued(notification).await;
        info!(notification_id = %notification.id, "notification event published");

        Ok(CreatedNotification {
            notification,
            publish_error: None,
        })
    }

    /// Admit a batch of notifications.
    ///
    /// Invalid items are skipped and counted rather than failing the batch;
    /// valid items are bulk-inserted and then published sequentially.
    pub async fn execute_batch(&self, cmd: CreateBatchCommand) -> Result<CreatedBatch> {
        if cmd.items.is_empty() || cmd.items.len() > MAX_BATCH_SIZE {
            warn!(size = cmd.items.len(), "batch size invalid");
            return Err(DomainError::BatchTooLarge {
                size: cmd.items.len(),
            });
        }

        let batch = Batch::new(cmd.idempotency_key);
        self.batches.create(&batch).await?;
        info!(batch_id = %batch.id, item_count = cmd.items.len(), "batch created");

        // First pass: validate and build entities, skipping invalid items.
        let mut notifications = Vec::new();
        let mut skipped = 0usize;
        for item in &cmd.items {
            let Some(channel) = Channel::parse(&item.channel) else {
                skipped += 1;
                continue;
            };
            // An invalid or absent priority falls back to normal.
            let priority = item
                .priority
                .as_deref()
                .and_then(Priority::parse)
                .unwrap_or_default();
            if rules::validate_content(channel, &item.content).is_err()
                || rules::validate_recipient(&item.recipient).is_err()
            {
                skipped += 1;
                continue;
            }

            notifications.push(
                Notification::new(item.recipient.clone(), channel, item.content.clone(), priority, None)
                    .with_batch(batch.id),
            );
        }

        if !notifications.is_empty() {
            self.repo.create_batch(&notifications).await?;
        }
        if skipped > 0 {
            warn!(batch_id = %batch.id, skipped, "some batch items skipped");
        }

        let events: Vec<NotificationEvent> = notifications.iter().map(event_for).collect();
        if let Err(e) = self.publisher.publish_batch(&events).await {
            error!(batch_id = %batch.id, error = %e, "failed to publish batch events");
            return Ok(CreatedBatch {
                batch,
                notifications,
                skipped,
                publish_error: Some(e),
            });
        }

        let mut queued = Vec::with_capacity(notifications.len());
        for n in notifications {
            queued.push(self.mark_queued(n).await);
        }
        info!(
            batch_id = %batch.id,
            notification_count = queued.len(),
            "batch events published"
        );

        Ok(CreatedBatch {
            batch,
            notifications: queued,
            skipped,
            publish_error: None,
        })
    }

    /// Dedupe on the fast store, falling back to the durable check when the
    /// store is unreachable. The unique index catches anything that slips
    /// through both.
    async fn check_idempotency(&self, key: &str) -> Result<()> {
        match self.idempotency.set_if_absent(key, IDEMPOTENCY_TTL).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(key, "duplicate idempotency key (cache)");
                Err(DomainError::DuplicateRequest)
            }
            Err(e) => {
                warn!(key, error = %e, "idempotency store check failed, falling back to repository");
                if self.repo.exists_by_idempotency_key(key).await? {
                    warn!(key, "duplicate idempotency key (repository fallback)");
                    Err(DomainError::DuplicateRequest)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Best-effort transition to `queued` after a successful publish; a
    /// failure here is corrected by the worker's terminal transition.
    async fn mark_queued(&self, mut notification: Notification) -> Notification {
        if let Err(e) = self
            .repo
            .update_status(&notification.id, Status::Queued, None, None)
            .await
        {
            error!(
                notification_id = %notification.id,
                error = %e,
                "failed to update status to queued"
            );
        }
        notification.status = Status::Queued;
        notification
    }
}

fn parse_priority(raw: Option<&str>) -> Result<Priority> {
    match raw {
        None | Some("") => Ok(Priority::Normal),
        Some(value) => Priority::parse(value).ok_or_else(|| {
            warn!(priority = value, "invalid priority");
            DomainError::InvalidPriority {
                value: value.to_string(),
            }
        }),
    }
}

fn event_for(n: &Notification) -> NotificationEvent {
    NotificationEvent {
        notification_id: n.id,
        batch_id: n.batch_id,
        recipient: n.recipient.clone(),
        channel: n.channel,
        content: n.content.clone(),
        priority: n.priority,
        idempotency_key: n.idempotency_key.clone(),
        created_at: n.created_at.to_rfc3339(),
    }
}
