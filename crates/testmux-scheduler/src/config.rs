//! Scheduler tuning knobs.

use std::time::Duration;

/// Static scheduler configuration.
///
/// There is no configuration file; values are fixed at process startup.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period of the dispatch tick.
    pub tick_interval: Duration,
    /// Maximum number of failure-triggered requeues per job.
    pub retry_limit: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            retry_limit: 1,
        }
    }
}
