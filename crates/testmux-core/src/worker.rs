//! Worker pool members.

use serde::{Deserialize, Serialize};

/// A pool member capable of executing jobs matching its single capability tag.
///
/// `busy` is true iff the worker is currently executing exactly one job; it
/// changes atomically with the assigned job's `Running` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub target: String,
    pub busy: bool,
}

impl Worker {
    /// Create an idle worker serving the given capability tag.
    pub fn new(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            busy: false,
        }
    }
}
