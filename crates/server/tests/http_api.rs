//! End-to-end tests of the HTTP surface against in-memory ports.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use courier_application::notifications::{
    CancelNotificationUseCase, CreateNotificationUseCase, NotificationQueries,
};
use courier_application::testing::{
    InMemoryBatchRepository, InMemoryIdempotencyStore, InMemoryNotificationRepository,
    RecordingPublisher,
};
use courier_server::routes;
use courier_server::state::AppState;

struct TestApp {
    router: Router,
    publisher: Arc<RecordingPublisher>,
}

fn test_app() -> TestApp {
    let repo = Arc::new(InMemoryNotificationRepository::new());
    let batches = Arc::new(InMemoryBatchRepository::new());
    let publisher = Arc::new(RecordingPublisher::new());

    let state = AppState {
        create: Arc::new(CreateNotificationUseCase::new(
            repo.clone(),
            batches.clone(),
            publisher.clone(),
            Arc::new(InMemoryIdempotencyStore::new()),
        )),
        cancel: Arc::new(CancelNotificationUseCase::new(repo.clone())),
        queries: Arc::new(NotificationQueries::new(repo.clone(), batches)),
        metrics: repo,
        probe: None,
        management: None,
    };

    TestApp {
        router: routes::app(state),
        publisher,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let correlation = response
        .headers()
        .get("x-correlation-id")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body, correlation)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn sms_body(key: &str) -> Value {
    json!({
        "recipient": "+905551234567",
        "channel": "sms",
        "content": "hi",
        "priority": "high",
        "idempotency_key": key,
    })
}

#[tokio::test]
async fn create_notification_returns_201_queued() {
    let app = test_app();

    let (status, body, correlation) =
        send(&app.router, post_json("/notifications", sms_body("k1"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["channel"], "sms");
    assert_eq!(body["priority"], "high");
    assert_eq!(body["recipient"], "+905551234567");
    assert!(body["id"].is_string());
    // Generated correlation id: 8 bytes as hex.
    assert_eq!(correlation.unwrap().len(), 16);
    assert_eq!(app.publisher.events().len(), 1);
}

#[tokio::test]
async fn duplicate_idempotency_key_returns_409() {
    let app = test_app();

    let (first, _, _) = send(&app.router, post_json("/notifications", sms_body("k1"))).await;
    assert_eq!(first, StatusCode::CREATED);

    let (second, body, _) = send(&app.router, post_json("/notifications", sms_body("k1"))).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "duplicate_request");

    // Totals unchanged: still exactly one notification.
    let (_, list, _) = send(&app.router, get("/notifications")).await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn invalid_single_item_returns_field_errors() {
    let app = test_app();

    let (status, body, _) = send(
        &app.router,
        post_json(
            "/notifications",
            json!({ "recipient": "", "channel": "fax", "content": "" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    let errors = body["error"]["details"]["validation_errors"]
        .as_array()
        .unwrap();
    assert_eq!(errors.len(), 3);
    assert!(app.publisher.events().is_empty());
}

#[tokio::test]
async fn oversized_batch_returns_400_with_max_size() {
    let app = test_app();
    let items: Vec<Value> = (0..1001)
        .map(|i| {
            json!({
                "recipient": format!("user{i}@example.com"),
                "channel": "email",
                "content": "hello",
            })
        })
        .collect();

    let (status, body, _) = send(
        &app.router,
        post_json("/notifications/batches", Value::Array(items)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"]["max_size"], 1000);
}

#[tokio::test]
async fn mixed_batch_skips_invalid_items() {
    let app = test_app();
    let items = json!([
        { "recipient": "+905551234567", "channel": "sms", "content": "valid" },
        { "recipient": "a@b.c", "channel": "x", "content": "bad channel" },
        { "recipient": "", "channel": "email", "content": "no recipient" },
    ]);

    let (status, body, _) = send(&app.router, post_json("/notifications/batches", items)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["skipped"], 2);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["status"], "queued");
    assert!(body["batch_id"].is_string());
}

#[tokio::test]
async fn get_round_trips_the_created_notification() {
    let app = test_app();
    let (_, created, _) = send(&app.router, post_json("/notifications", sms_body("k1"))).await;
    let id = created["id"].as_str().unwrap();

    let (status, fetched, _) = send(&app.router, get(&format!("/notifications/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    // `updated_at` moves when the row transitions to queued; everything
    // else round-trips exactly.
    for field in ["id", "recipient", "channel", "content", "priority", "status", "created_at"] {
        assert_eq!(fetched[field], created[field], "field {field}");
    }

    let (missing, body, _) = send(
        &app.router,
        get(&format!("/notifications/{}", uuid::Uuid::new_v4())),
    )
    .await;
    assert_eq!(missing, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    // Malformed ids read as absent resources.
    let (malformed, _, _) = send(&app.router, get("/notifications/not-a-uuid")).await;
    assert_eq!(malformed, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_supports_filters() {
    let app = test_app();
    for (channel, recipient) in [("sms", "+905551234567"), ("email", "a@b.c")] {
        let body = json!({ "recipient": recipient, "channel": channel, "content": "hi" });
        send(&app.router, post_json("/notifications", body)).await;
    }

    let (status, body, _) = send(&app.router, get("/notifications")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (_, sms_only, _) = send(&app.router, get("/notifications?channel=sms")).await;
    assert_eq!(sms_only["total"], 1);
    assert_eq!(sms_only["notifications"][0]["channel"], "sms");

    let (_, queued, _) = send(&app.router, get("/notifications?status=queued&limit=1")).await;
    assert_eq!(queued["total"], 2);
    assert_eq!(queued["notifications"].as_array().unwrap().len(), 1);

    // Unknown filter values are ignored.
    let (_, lenient, _) = send(&app.router, get("/notifications?status=bogus")).await;
    assert_eq!(lenient["total"], 2);
}

#[tokio::test]
async fn cancel_is_204_then_terminal_cancel_is_404() {
    let app = test_app();
    let (_, created, _) = send(&app.router, post_json("/notifications", sms_body("k1"))).await;
    let id = created["id"].as_str().unwrap();

    let (status, _, _) = send(
        &app.router,
        post_json(&format!("/notifications/{id}/cancel"), json!(null)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched, _) = send(&app.router, get(&format!("/notifications/{id}"))).await;
    assert_eq!(fetched["status"], "cancelled");

    let (again, body, _) = send(
        &app.router,
        post_json(&format!("/notifications/{id}/cancel"), json!(null)),
    )
    .await;
    assert_eq!(again, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn batch_endpoints_round_trip() {
    let app = test_app();
    let items = json!([
        { "recipient": "+905551234567", "channel": "sms", "content": "one" },
        { "recipient": "a@b.c", "channel": "email", "content": "two" },
    ]);
    let (_, created, _) = send(&app.router, post_json("/notifications/batches", items)).await;
    let batch_id = created["batch_id"].as_str().unwrap();

    let (status, body, _) = send(
        &app.router,
        get(&format!("/batches/{batch_id}/notifications")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["batch"]["id"], created["batch_id"]);
    assert_eq!(body["notifications"].as_array().unwrap().len(), 2);

    let (status, body, _) = send(
        &app.router,
        post_json(&format!("/batches/{batch_id}/cancel"), json!(null)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], 2);

    let (missing, _, _) = send(
        &app.router,
        get(&format!("/batches/{}/notifications", uuid::Uuid::new_v4())),
    )
    .await;
    assert_eq!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let app = test_app();
    send(&app.router, post_json("/notifications", sms_body("k1"))).await;

    let (status, body, _) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body, _) = send(&app.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"]["queued"], 1);
    assert_eq!(body["notifications"]["total"], 1);
    assert_eq!(body["success_rate"], 0.0);
    // No management client wired: the queues section is absent.
    assert!(body.get("queues").is_none());
}

#[tokio::test]
async fn supplied_correlation_id_is_echoed() {
    let app = test_app();
    let request = Request::builder()
        .uri("/health")
        .header("x-correlation-id", "abcdef0123456789")
        .body(Body::empty())
        .unwrap();

    let (_, _, correlation) = send(&app.router, request).await;
    assert_eq!(correlation.as_deref(), Some("abcdef0123456789"));
}
