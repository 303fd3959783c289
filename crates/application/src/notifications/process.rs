//! Delivery: drive one queued notification to a terminal state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use courier_domain::{DeliveryAttempt, DomainError, NotificationId, Result, Status};

use crate::ports::{
    DeliveryAttemptRepository, DeliveryClient, DeliveryRequest, NotificationRepository,
    RateLimiter,
};

/// Retry budget for in-handler delivery.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Attempts per message (default 5).
    pub max_attempts: u32,
    /// First inter-attempt sleep, doubled after each failure (default 1 s).
    pub initial_backoff: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Command handled per consumed broker message.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub notification_id: NotificationId,
}

/// Use case: rate-gate, deliver with bounded retry, journal every attempt,
/// and record the terminal transition.
pub struct ProcessNotificationUseCase {
    repo: Arc<dyn NotificationRepository>,
    attempts: Arc<dyn DeliveryAttemptRepository>,
    rate_limiter: Arc<dyn RateLimiter>,
    delivery: Arc<dyn DeliveryClient>,
    config: DeliveryConfig,
}

impl ProcessNotificationUseCase {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        attempts: Arc<dyn DeliveryAttemptRepository>,
        rate_limiter: Arc<dyn RateLimiter>,
        delivery: Arc<dyn DeliveryClient>,
    ) -> Self {
        Self {
            repo,
            attempts,
            rate_limiter,
            delivery,
            config: DeliveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DeliveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Process one notification.
    ///
    /// Errors returned here are transient from the consumer's point of view
    /// (the message is redelivered); a `NotFound` is dead-lettered by the
    /// consumer's redelivery bound.
    pub async fn execute(&self, cmd: ProcessCommand) -> Result<()> {
        let id = cmd.notification_id;
        info!(notification_id = %id, "processing notification");

        let notification = self.repo.get_by_id(&id).await.map_err(|e| {
            error!(notification_id = %id, error = %e, "failed to load notification");
            e
        })?;

        // Redeliveries of already-finished work are acked without effect.
        if notification.is_terminal() {
            info!(
                notification_id = %id,
                status = %notification.status,
                "notification already in terminal state"
            );
            return Ok(());
        }

        match self.rate_limiter.allow(notification.channel).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(notification_id = %id, channel = %notification.channel, "rate limit exceeded");
                return Err(DomainError::RateLimited {
                    channel: notification.channel,
                });
            }
            Err(e) => {
                error!(notification_id = %id, error = %e, "rate limiter error");
                return Err(e);
            }
        }

        let request = DeliveryRequest {
            to: notification.recipient.clone(),
            channel: notification.channel.as_str().to_string(),
            content: notification.content.clone(),
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.initial_backoff;
        let mut last_error: Option<crate::ports::DeliveryError> = None;

        for attempt in 1..=max_attempts {
            info!(
                notification_id = %id,
                attempt,
                channel = %notification.channel,
                "delivery attempt"
            );

            match self.delivery.deliver(&request).await {
                Ok((response, status_code)) => {
                    let row =
                        DeliveryAttempt::succeeded(id, attempt, status_code, response.message_id);
                    if let Err(e) = self.attempts.create(&row).await {
                        error!(notification_id = %id, attempt, error = %e, "failed to record delivery attempt");
                    }

                    let now = Utc::now();
                    if let Err(e) = self
                        .repo
                        .update_status(&id, Status::Sent, Some(now), None)
                        .await
                    {
                        // The delivery itself succeeded; don't fail the message.
                        error!(notification_id = %id, error = %e, "failed to update status to sent");
                    }
                    info!(
                        notification_id = %id,
                        attempt,
                        message_id = %row.response_body,
                        "notification delivered"
                    );
                    return Ok(());
                }
                Err(e) => {
                    let row = DeliveryAttempt::failed(id, attempt, e.status_code, e.message.clone());
                    if let Err(persist_err) = self.attempts.create(&row).await {
                        error!(
                            notification_id = %id,
                            attempt,
                            error = %persist_err,
                            "failed to record delivery attempt"
                        );
                    }
                    warn!(
                        notification_id = %id,
                        attempt,
                        status_code = e.status_code,
                        error = %e,
                        "delivery attempt failed"
                    );
                    last_error = Some(e);

                    if attempt < max_attempts {
                        info!(
                            notification_id = %id,
                            backoff_ms = backoff.as_millis() as u64,
                            "retrying after backoff"
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }

        // Retry budget exhausted: record the durable failure.
        let last = last_error.expect("at least one attempt was made");
        let mut reason = format!("failed after {max_attempts} attempts: {last}");
        if last.status_code > 0 {
            reason = format!("status {}: {}", last.status_code, reason);
        }
        if let Err(e) = self
            .repo
            .update_status(&id, Status::Failed, None, Some(reason))
            .await
        {
            error!(notification_id = %id, error = %e, "failed to update status to failed");
        }
        error!(
            notification_id = %id,
            attempts = max_attempts,
            last_code = last.status_code,
            last_error = %last,
            "notification delivery failed permanently"
        );

        Err(DomainError::infrastructure(format!(
            "delivery failed: {last}"
        )))
    }
}
