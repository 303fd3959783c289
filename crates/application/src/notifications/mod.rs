//! Notification use cases.

mod cancel;
mod create;
mod process;
mod queries;

pub use cancel::CancelNotificationUseCase;
pub use create::{
    BatchItem, CreateBatchCommand, CreateCommand, CreateNotificationUseCase, CreatedBatch,
    CreatedNotification,
};
pub use process::{DeliveryConfig, ProcessCommand, ProcessNotificationUseCase};
pub use queries::{BatchWithNotifications, ListQuery, NotificationQueries};
