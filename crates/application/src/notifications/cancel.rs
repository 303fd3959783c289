//! Cancellation of non-terminal notifications.

use std::sync::Arc;

use tracing::info;

use courier_domain::{BatchId, NotificationId, Result};

use crate::ports::NotificationRepository;

/// Use case: cancel notifications that have not reached a terminal state.
pub struct CancelNotificationUseCase {
    repo: Arc<dyn NotificationRepository>,
}

impl CancelNotificationUseCase {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// Cancel one notification iff it is `pending` or `queued`. Terminal or
    /// missing rows both surface as `NotFound`; the endpoint deliberately
    /// does not distinguish them.
    pub async fn execute(&self, id: NotificationId) -> Result<()> {
        self.repo.cancel_pending(&id).await?;
        info!(notification_id = %id, "notification cancelled");
        Ok(())
    }

    /// Cancel every non-terminal notification of a batch; returns the
    /// affected row count (0 is a valid outcome).
    pub async fn execute_batch(&self, batch_id: BatchId) -> Result<u64> {
        let cancelled = self.repo.cancel_pending_by_batch(&batch_id).await?;
        info!(batch_id = %batch_id, cancelled, "batch cancellation applied");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_domain::{Channel, DomainError, Notification, Priority, Status};

    use crate::ports::NotificationRepository as _;
    use crate::testing::InMemoryNotificationRepository;

    async fn seed(repo: &InMemoryNotificationRepository, status: Status) -> NotificationId {
        let n = Notification::new("r", Channel::Push, "c", Priority::Low, None);
        let id = n.id;
        repo.create(&n).await.unwrap();
        if status != Status::Pending {
            repo.update_status(&id, status, None, None).await.unwrap();
        }
        id
    }

    #[tokio::test]
    async fn cancels_pending_and_queued() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let uc = CancelNotificationUseCase::new(repo.clone());

        for status in [Status::Pending, Status::Queued] {
            let id = seed(&repo, status).await;
            uc.execute(id).await.unwrap();
            assert_eq!(repo.get_by_id(&id).await.unwrap().status, Status::Cancelled);
        }
    }

    #[tokio::test]
    async fn terminal_rows_surface_not_found() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let uc = CancelNotificationUseCase::new(repo.clone());

        for status in [Status::Sent, Status::Failed, Status::Cancelled] {
            let id = seed(&repo, status).await;
            let err = uc.execute(id).await.unwrap_err();
            assert!(matches!(err, DomainError::NotFound));
            // Terminal state is untouched.
            assert_eq!(repo.get_by_id(&id).await.unwrap().status, status);
        }

        let err = uc.execute(NotificationId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn batch_cancel_counts_only_non_terminal_rows() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let uc = CancelNotificationUseCase::new(repo.clone());

        let batch_id = BatchId::new();
        let mut ids = Vec::new();
        for status in [Status::Pending, Status::Queued, Status::Sent] {
            let n = Notification::new("r", Channel::Sms, "c", Priority::Normal, None)
                .with_batch(batch_id);
            let id = n.id;
            repo.create(&n).await.unwrap();
            if status != Status::Pending {
                repo.update_status(&id, status, None, None).await.unwrap();
            }
            ids.push(id);
        }

        let cancelled = uc.execute_batch(batch_id).await.unwrap();
        assert_eq!(cancelled, 2);
        assert_eq!(repo.get_by_id(&ids[2]).await.unwrap().status, Status::Sent);

        // Unknown batch cancels nothing.
        assert_eq!(uc.execute_batch(BatchId::new()).await.unwrap(), 0);
    }
}
