//! API server for the testmux job queue.
//!
//! Thin HTTP boundary over the scheduler: job submission, job queries,
//! and a health probe.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
