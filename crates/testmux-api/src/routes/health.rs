//! Health check endpoint.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use serde_json::{Value, json};

use testmux_core::JobStatus;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let jobs = state.scheduler.jobs().await;
    let workers = state.scheduler.workers().await;
    Json(json!({
        "status": "ok",
        "jobs": jobs.len(),
        "running": jobs.iter().filter(|j| j.status == JobStatus::Running).count(),
        "idle_workers": workers.iter().filter(|w| !w.busy).count(),
        "workers": workers.len(),
    }))
}
