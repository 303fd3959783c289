//! Notification and batch endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::DateTime;
use serde::Deserialize;

use courier_application::notifications::{
    BatchItem, CreateBatchCommand, CreateCommand, ListQuery,
};
use courier_domain::{BatchId, Channel, DomainError, Notification, NotificationId, Status};

use crate::dto::{
    BatchCreatedResponse, BatchWithNotificationsResponse, CancelBatchResponse, ListResponse,
    NotificationItem,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(create_notification).get(list_notifications))
        .route("/notifications/batches", post(create_batch))
        .route("/notifications/{id}", get(get_notification))
        .route("/notifications/{id}/cancel", post(cancel_notification))
        .route("/batches/{id}/notifications", get(get_batch))
        .route("/batches/{id}/cancel", post(cancel_batch))
}

/// POST /notifications
async fn create_notification(
    State(state): State<AppState>,
    Json(item): Json<NotificationItem>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let errors = item.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let created = state
        .create
        .execute(CreateCommand {
            recipient: item.recipient,
            channel: item.channel,
            priority: item.priority,
            content: item.content,
            idempotency_key: item.idempotency_key,
        })
        .await?;

    // The row is persisted but unpublished; surface the broker failure.
    if let Some(publish_error) = created.publish_error {
        return Err(publish_error.into());
    }

    Ok((StatusCode::CREATED, Json(created.notification)))
}

/// POST /notifications/batches
///
/// Per-item validation happens inside the use case: invalid items are
/// skipped and counted, never failing the whole batch.
async fn create_batch(
    State(state): State<AppState>,
    Json(items): Json<Vec<NotificationItem>>,
) -> Result<(StatusCode, Json<BatchCreatedResponse>), ApiError> {
    let idempotency_key = items.first().and_then(|item| item.idempotency_key.clone());
    let command = CreateBatchCommand {
        items: items
            .into_iter()
            .map(|item| BatchItem {
                recipient: item.recipient,
                channel: item.channel,
                priority: item.priority,
                content: item.content,
            })
            .collect(),
        idempotency_key,
    };

    let created = state.create.execute_batch(command).await?;
    if let Some(publish_error) = created.publish_error {
        return Err(publish_error.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(BatchCreatedResponse {
            batch_id: created.batch.id,
            notifications: created.notifications,
            skipped: created.skipped,
        }),
    ))
}

/// GET /notifications/:id
async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let id = parse_notification_id(&id)?;
    Ok(Json(state.queries.get(id).await?))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    status: Option<String>,
    channel: Option<String>,
    from: Option<String>,
    to: Option<String>,
    batch_id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

/// GET /notifications
///
/// Unrecognized filter values are ignored rather than rejected.
async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let query = ListQuery {
        status: params.status.as_deref().and_then(Status::parse),
        channel: params.channel.as_deref().and_then(Channel::parse),
        from_time: params
            .from
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.to_utc()),
        to_time: params
            .to
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.to_utc()),
        batch_id: params.batch_id.as_deref().and_then(BatchId::parse),
        limit: params.limit.as_deref().and_then(|s| s.parse().ok()),
        offset: params.offset.as_deref().and_then(|s| s.parse().ok()),
    };

    let result = state.queries.list(query).await?;
    Ok(Json(ListResponse {
        notifications: result.notifications,
        total: result.total,
    }))
}

/// POST /notifications/:id/cancel
async fn cancel_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_notification_id(&id)?;
    state.cancel.execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /batches/:id/notifications
async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BatchWithNotificationsResponse>, ApiError> {
    let id = parse_batch_id(&id)?;
    let result = state.queries.get_batch(id).await?;
    Ok(Json(BatchWithNotificationsResponse {
        batch: result.batch,
        notifications: result.notifications,
    }))
}

/// POST /batches/:id/cancel
async fn cancel_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelBatchResponse>, ApiError> {
    let id = parse_batch_id(&id)?;
    let cancelled = state.cancel.execute_batch(id).await?;
    Ok(Json(CancelBatchResponse { cancelled }))
}

// Malformed ids can't match any row; they read as absent resources.
fn parse_notification_id(raw: &str) -> Result<NotificationId, ApiError> {
    NotificationId::parse(raw).ok_or_else(|| DomainError::NotFound.into())
}

fn parse_batch_id(raw: &str) -> Result<BatchId, ApiError> {
    BatchId::parse(raw).ok_or_else(|| DomainError::NotFound.into())
}
