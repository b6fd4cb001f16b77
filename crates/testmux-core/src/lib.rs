//! Core domain types for the testmux job queue.
//!
//! This crate contains:
//! - Job identifiers
//! - Job records, submission requests, and the job status state machine
//! - Worker definitions
//! - The shared error type

pub mod error;
pub mod id;
pub mod job;
pub mod worker;

pub use error::{Error, Result};
pub use id::JobId;
pub use job::{Job, JobRequest, JobStatus};
pub use worker::Worker;
