//! Read-side projections: get by id, get by batch, filtered listing.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use courier_domain::{Batch, BatchId, Channel, Notification, NotificationId, Result, Status};

use crate::ports::{BatchRepository, ListFilter, ListResult, NotificationRepository};

/// Listing parameters as accepted from the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub status: Option<Status>,
    pub channel: Option<Channel>,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    pub batch_id: Option<BatchId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A batch together with its notifications.
#[derive(Debug, Clone)]
pub struct BatchWithNotifications {
    pub batch: Batch,
    pub notifications: Vec<Notification>,
}

/// Use case bundle for all read paths.
pub struct NotificationQueries {
    repo: Arc<dyn NotificationRepository>,
    batches: Arc<dyn BatchRepository>,
}

impl NotificationQueries {
    pub fn new(repo: Arc<dyn NotificationRepository>, batches: Arc<dyn BatchRepository>) -> Self {
        Self { repo, batches }
    }

    pub async fn get(&self, id: NotificationId) -> Result<Notification> {
        self.repo.get_by_id(&id).await
    }

    pub async fn get_batch(&self, batch_id: BatchId) -> Result<BatchWithNotifications> {
        let batch = self.batches.get_by_id(&batch_id).await?;
        let notifications = self.repo.get_by_batch_id(&batch_id).await?;
        Ok(BatchWithNotifications {
            batch,
            notifications,
        })
    }

    pub async fn list(&self, query: ListQuery) -> Result<ListResult> {
        // Limit is clamped to 1..=1000 (default 100); offset floors at 0.
        let limit = match query.limit {
            Some(l) if (1..=1000).contains(&l) => l,
            _ => 100,
        };
        let offset = query.offset.filter(|o| *o >= 0).unwrap_or(0);

        let filter = ListFilter {
            status: query.status,
            channel: query.channel,
            from_time: query.from_time,
            to_time: query.to_time,
            batch_id: query.batch_id,
            limit,
            offset,
        };
        self.repo.list(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_domain::{DomainError, Priority};

    use crate::ports::{BatchRepository as _, NotificationRepository as _};
    use crate::testing::{InMemoryBatchRepository, InMemoryNotificationRepository};

    fn queries() -> (
        NotificationQueries,
        Arc<InMemoryNotificationRepository>,
        Arc<InMemoryBatchRepository>,
    ) {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let batches = Arc::new(InMemoryBatchRepository::new());
        (
            NotificationQueries::new(repo.clone(), batches.clone()),
            repo,
            batches,
        )
    }

    #[tokio::test]
    async fn get_returns_the_stored_entity() {
        let (q, repo, _) = queries();
        let n = Notification::new("r", Channel::Sms, "c", Priority::High, Some("k".into()));
        repo.create(&n).await.unwrap();

        let fetched = q.get(n.id).await.unwrap();
        assert_eq!(fetched, n);

        let err = q.get(NotificationId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn get_batch_returns_batch_and_members() {
        let (q, repo, batches) = queries();
        let batch = Batch::new(None);
        batches.create(&batch).await.unwrap();
        for _ in 0..2 {
            let n = Notification::new("r", Channel::Email, "c", Priority::Normal, None)
                .with_batch(batch.id);
            repo.create(&n).await.unwrap();
        }

        let result = q.get_batch(batch.id).await.unwrap();
        assert_eq!(result.batch.id, batch.id);
        assert_eq!(result.notifications.len(), 2);

        let err = q.get_batch(BatchId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let (q, repo, _) = queries();
        for i in 0..5 {
            let channel = if i % 2 == 0 { Channel::Sms } else { Channel::Email };
            let n = Notification::new(format!("r{i}"), channel, "c", Priority::Normal, None);
            repo.create(&n).await.unwrap();
        }

        let all = q.list(ListQuery::default()).await.unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.notifications.len(), 5);

        let sms_only = q
            .list(ListQuery {
                channel: Some(Channel::Sms),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sms_only.total, 3);
        assert!(sms_only.notifications.iter().all(|n| n.channel == Channel::Sms));

        let page = q
            .list(ListQuery {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.notifications.len(), 2);

        // Out-of-range limit falls back to the default.
        let clamped = q
            .list(ListQuery {
                limit: Some(5000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(clamped.notifications.len(), 5);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (q, repo, _) = queries();
        let n = Notification::new("r", Channel::Push, "c", Priority::Normal, None);
        repo.create(&n).await.unwrap();
        repo.update_status(&n.id, Status::Queued, None, None)
            .await
            .unwrap();
        let other = Notification::new("r2", Channel::Push, "c", Priority::Normal, None);
        repo.create(&other).await.unwrap();

        let queued = q
            .list(ListQuery {
                status: Some(Status::Queued),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(queued.total, 1);
        assert_eq!(queued.notifications[0].id, n.id);
    }
}
