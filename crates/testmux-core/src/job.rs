//! Job records, submission requests, and the job lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, JobId, Result};

/// Default priority tag applied when a submission carries none.
pub const DEFAULT_PRIORITY: &str = "normal";

/// Lifecycle status of a job.
///
/// Jobs move `Queued -> Running -> {Completed | Queued (retry)}`. `Failed`
/// is part of the status vocabulary but the default retry policy completes
/// jobs once their retry budget is exhausted instead of failing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A job submission record.
///
/// `org_id`, `app_version_id`, `test_path`, and `target` are required and
/// must be non-empty; `priority` defaults to [`DEFAULT_PRIORITY`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub org_id: String,
    pub app_version_id: String,
    pub test_path: String,
    #[serde(default)]
    pub priority: Option<String>,
    pub target: String,
}

impl JobRequest {
    /// Check that every required field is present and non-empty.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("org_id", &self.org_id),
            ("app_version_id", &self.app_version_id),
            ("test_path", &self.test_path),
            ("target", &self.target),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidInput(format!("missing required field: {name}")));
            }
        }
        Ok(())
    }
}

/// One test-execution request with target capability and lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: JobId,
    pub org_id: String,
    pub app_version_id: String,
    pub test_path: String,
    pub priority: String,
    pub target: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub retries: u32,
    /// Worker currently executing this job. Set iff `status == Running`.
    #[serde(skip)]
    pub assigned_worker: Option<String>,
}

impl Job {
    /// Create a freshly queued job from a submission request.
    pub fn from_request(req: JobRequest) -> Self {
        let priority = req
            .priority
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PRIORITY.to_string());
        Self {
            id: JobId::new(),
            org_id: req.org_id,
            app_version_id: req.app_version_id,
            test_path: req.test_path,
            priority,
            target: req.target,
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            started_at: None,
            completed_at: None,
            retries: 0,
            assigned_worker: None,
        }
    }
}
