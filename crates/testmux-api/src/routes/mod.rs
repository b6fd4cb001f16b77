//! API routes.

pub mod health;
pub mod jobs;

use axum::Router;

use crate::AppState;

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/jobs", jobs::router())
        .merge(health::router())
        .with_state(state)
}
