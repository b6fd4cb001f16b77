//! Shared helpers for API integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use testmux_api::routes;
use testmux_api::state::AppState;
use testmux_core::Worker;
use testmux_scheduler::{FixedOutcome, Scheduler, SchedulerConfig};

/// Build the application router around a deterministic scheduler.
///
/// Mirrors the router construction in `main.rs` so tests exercise the same
/// routes production serves, minus the network-facing middleware. The
/// scheduler handle is returned so tests can drive dispatch ticks manually
/// instead of waiting out the periodic loop.
pub fn build_test_app(outcome: FixedOutcome) -> (Router, Arc<Scheduler>) {
    let workers = vec![
        Worker::new("worker1", "emulator"),
        Worker::new("worker2", "device"),
    ];
    let scheduler = Arc::new(Scheduler::new(
        workers,
        SchedulerConfig::default(),
        Arc::new(outcome),
    ));
    let app = routes::router(AppState::new(scheduler.clone()));
    (app, scheduler)
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
