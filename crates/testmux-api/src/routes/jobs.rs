//! Job submission and query endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use testmux_core::{Job, JobId, JobRequest};

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs).post(submit_job))
        .route("/{job_id}", get(get_job))
}

/// Submission body. Every field is optional at the serde level so that a
/// missing field surfaces as a 400 with an error body, not a decode
/// rejection.
#[derive(Debug, Deserialize)]
struct SubmitJobRequest {
    #[serde(default)]
    org_id: Option<String>,
    #[serde(default)]
    app_version_id: Option<String>,
    #[serde(default)]
    test_path: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    target: Option<String>,
}

impl SubmitJobRequest {
    fn into_job_request(self) -> Result<JobRequest, ApiError> {
        let require = |value: Option<String>, name: &str| {
            value
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::BadRequest(format!("missing required field: {name}")))
        };
        Ok(JobRequest {
            org_id: require(self.org_id, "org_id")?,
            app_version_id: require(self.app_version_id, "app_version_id")?,
            test_path: require(self.test_path, "test_path")?,
            priority: self.priority,
            target: require(self.target, "target")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct SubmitJobResponse {
    job_id: JobId,
}

async fn submit_job(
    State(state): State<AppState>,
    Json(req): Json<SubmitJobRequest>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), ApiError> {
    let req = req.into_job_request()?;
    let job_id = state.scheduler.submit(req).await?;
    Ok((StatusCode::CREATED, Json(SubmitJobResponse { job_id })))
}

async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    // An unparseable id cannot name a stored job, so it reads as unknown.
    let id: JobId = job_id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("job {job_id} not found")))?;
    let job = state.scheduler.job(&id).await?;
    Ok(Json(job))
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.scheduler.jobs().await)
}
