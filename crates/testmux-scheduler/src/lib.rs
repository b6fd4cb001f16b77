//! Job scheduling for testmux.
//!
//! Owns all mutable scheduling state: the job store, the per-app-version
//! submission index, and the worker pool, guarded as one critical region.
//! A periodic dispatch tick matches queued jobs to idle workers of the
//! same capability; each match schedules a simulated execution whose
//! outcome feeds a bounded retry policy.

pub mod config;
pub mod dispatcher;
pub mod outcome;
pub mod pool;
pub mod queue;
pub mod store;

pub use config::SchedulerConfig;
pub use dispatcher::{Assignment, Scheduler};
pub use outcome::{FixedOutcome, OutcomeDecider, RandomOutcome};
pub use pool::WorkerPool;
pub use queue::SubmissionIndex;
pub use store::JobStore;
