//! Submission queue index.

use indexmap::IndexMap;

use testmux_core::{JobId, JobStatus};

use crate::store::JobStore;

/// Secondary index grouping queued job ids by `app_version_id`, preserving
/// submission order within each group.
///
/// Ids are never removed once added; whether an entry is still dispatchable
/// is decided by the job's status at scan time, not by membership here.
#[derive(Debug, Default)]
pub struct SubmissionIndex {
    groups: IndexMap<String, Vec<JobId>>,
}

impl SubmissionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job id to its app-version group, creating the group on
    /// first use.
    pub fn enqueue(&mut self, app_version_id: &str, job_id: JobId) {
        self.groups
            .entry(app_version_id.to_string())
            .or_default()
            .push(job_id);
    }

    /// Find the first queued job whose target matches, scanning app-version
    /// groups in insertion order and each group in submission order.
    ///
    /// Two queued jobs with the same target from different app versions are
    /// not ordered by submission time: the one in the group visited first
    /// wins.
    pub fn find_eligible(&self, store: &JobStore, target: &str) -> Option<JobId> {
        for ids in self.groups.values() {
            for id in ids {
                let Some(job) = store.get(id) else { continue };
                if job.status == JobStatus::Queued && job.target == target {
                    return Some(*id);
                }
            }
        }
        None
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
