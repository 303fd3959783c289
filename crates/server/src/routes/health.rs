//! Health and metrics endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
}

/// GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let healthy = match &state.probe {
        Some(probe) => probe.healthy().await,
        None => true,
    };

    if healthy {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy" })),
        )
    }
}

/// GET /metrics
///
/// Row counts and rates always; queue depths only when the management API
/// answers (a broken management API degrades the payload, not the endpoint).
async fn metrics(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.metrics.notification_stats().await?;

    let mut body = json!({
        "notifications": {
            "pending": stats.pending,
            "queued": stats.queued,
            "sent": stats.sent,
            "failed": stats.failed,
            "total": stats.total,
        },
        "success_rate": rate(stats.sent, stats.total),
        "failure_rate": rate(stats.failed, stats.total),
    });

    if let Some(management) = &state.management {
        let depths = management.queue_depths().await;
        let queues: serde_json::Map<String, serde_json::Value> = depths
            .into_iter()
            .map(|d| {
                (
                    d.queue,
                    json!({ "total": d.depth, "ready": d.ready, "unacked": d.unacked }),
                )
            })
            .collect();
        body["queues"] = serde_json::Value::Object(queues);
    }

    Ok(Json(body))
}

fn rate(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::rate;

    #[test]
    fn rate_handles_zero_total() {
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(1, 4), 25.0);
        assert_eq!(rate(0, 10), 0.0);
    }
}
