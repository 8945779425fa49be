//! HTTP surface tests: drive the router directly with tower's oneshot

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use shared_timer::state::AppState;
use shared_timer::store::MemoryStore;
use shared_timer::timer::TimerAuthority;
use shared_timer::create_router;

fn test_app() -> axum::Router {
    let store = Arc::new(MemoryStore::new());
    let timer = Arc::new(TimerAuthority::new(
        store,
        60_000,
        Duration::from_millis(1_000),
    ));
    let state = Arc::new(AppState::new(timer, 0, "127.0.0.1".to_string()));
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = test_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn state_endpoint_is_inactive_before_any_start() {
    let app = test_app();
    let response = app
        .oneshot(Request::get("/timer/state").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["isActive"], false);
    assert_eq!(json["timeLeft"], 0);
}

#[tokio::test]
async fn start_with_body_then_state_reports_the_run() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/timer/start")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"duration":30000}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "started");

    let response = app
        .oneshot(Request::get("/timer/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["isActive"], true);
    let time_left = json["timeLeft"].as_i64().unwrap();
    assert!(time_left > 0 && time_left <= 30_000);
}

#[tokio::test]
async fn start_without_body_uses_the_default_duration() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/timer/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/timer/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    let end = json["endTime"].as_i64().unwrap();
    let start = json["startTime"].as_i64().unwrap();
    assert_eq!(end - start, 60_000);
}

#[tokio::test]
async fn stop_when_idle_is_a_noop() {
    let app = test_app();
    let response = app
        .oneshot(Request::post("/timer/stop").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "noop");
}

#[tokio::test]
async fn stop_after_start_clears_the_run() {
    let app = test_app();

    app.clone()
        .oneshot(
            Request::post("/timer/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(Request::post("/timer/stop").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["status"], "stopped");

    let response = app
        .oneshot(Request::get("/timer/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["isActive"], false);
}

#[tokio::test]
async fn status_endpoint_includes_timer_and_metadata() {
    let app = test_app();

    app.clone()
        .oneshot(
            Request::post("/timer/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["timer"]["isActive"], false);
    assert_eq!(json["last_command"], "reset");
    assert_eq!(json["host"], "127.0.0.1");
}
