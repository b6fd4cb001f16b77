//! The dispatch loop: matches queued jobs to idle workers and settles
//! simulated executions.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use testmux_core::{Error, Job, JobId, JobRequest, JobStatus, Result, Worker};

use crate::config::SchedulerConfig;
use crate::outcome::OutcomeDecider;
use crate::pool::WorkerPool;
use crate::queue::SubmissionIndex;
use crate::store::JobStore;

/// A job-to-worker pairing produced by one dispatch pass.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub job_id: JobId,
    pub worker_id: String,
}

/// All mutable scheduling state, guarded as one critical region so a
/// worker's busy flag and its job's status are never observed out of step.
struct SchedulerState {
    store: JobStore,
    index: SubmissionIndex,
    pool: WorkerPool,
}

impl SchedulerState {
    fn new(workers: Vec<Worker>) -> Self {
        Self {
            store: JobStore::new(),
            index: SubmissionIndex::new(),
            pool: WorkerPool::new(workers),
        }
    }

    /// Validate a submission and record the new job in the store and the
    /// app-version index.
    fn admit(&mut self, req: JobRequest) -> Result<JobId> {
        req.validate()?;
        let job = Job::from_request(req);
        let id = job.id;
        self.index.enqueue(&job.app_version_id, id);
        self.store.insert(job);
        Ok(id)
    }

    /// One matching pass over the pool.
    ///
    /// Idle workers are snapshotted at the start of the pass; each gets at
    /// most one job. A worker that fails to acquire is skipped so one bad
    /// slot cannot stall the rest of the tick.
    fn match_idle_workers(&mut self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for worker in self.pool.idle() {
            let Some(job_id) = self.index.find_eligible(&self.store, &worker.target) else {
                continue;
            };
            match self.assign(job_id, &worker.id) {
                Ok(()) => assignments.push(Assignment {
                    job_id,
                    worker_id: worker.id,
                }),
                Err(e) => {
                    error!(job_id = %job_id, worker_id = %worker.id, error = %e,
                        "failed to assign job");
                }
            }
        }
        assignments
    }

    /// Acquire the worker and move the job to `Running` in one step.
    fn assign(&mut self, job_id: JobId, worker_id: &str) -> Result<()> {
        let job = self
            .store
            .get_mut(&job_id)
            .ok_or_else(|| Error::InvariantViolation(format!("assigned job {job_id} is not in the store")))?;
        self.pool.acquire(worker_id)?;
        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        job.assigned_worker = Some(worker_id.to_string());
        Ok(())
    }

    /// Apply an execution outcome and free the worker.
    ///
    /// The worker is released exactly once per execution regardless of how
    /// the job record settles; a job-side invariant violation must not leak
    /// the worker.
    fn settle(&mut self, assignment: &Assignment, success_draw: bool, retry_limit: u32) -> Result<JobStatus> {
        let settled = self.apply_outcome(assignment, success_draw, retry_limit);
        let released = self.pool.release(&assignment.worker_id);
        let status = settled?;
        released?;
        Ok(status)
    }

    fn apply_outcome(&mut self, assignment: &Assignment, success_draw: bool, retry_limit: u32) -> Result<JobStatus> {
        let job = self.store.get_mut(&assignment.job_id).ok_or_else(|| {
            Error::InvariantViolation(format!("settled job {} is not in the store", assignment.job_id))
        })?;
        if job.status != JobStatus::Running {
            return Err(Error::InvariantViolation(format!(
                "job {} settled while {}",
                job.id, job.status
            )));
        }
        if job.assigned_worker.as_deref() != Some(assignment.worker_id.as_str()) {
            return Err(Error::InvariantViolation(format!(
                "job {} settled by worker {} but assigned to {:?}",
                job.id, assignment.worker_id, job.assigned_worker
            )));
        }

        // The retry budget caps failures, not successes: once it is spent,
        // the draw no longer matters.
        let success = success_draw || job.retries >= retry_limit;
        job.assigned_worker = None;
        if success {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            Ok(JobStatus::Completed)
        } else {
            job.status = JobStatus::Queued;
            job.retries += 1;
            Ok(JobStatus::Queued)
        }
    }
}

/// The single scheduling authority: accepts submissions, runs the dispatch
/// tick, and settles simulated executions.
///
/// Submission and query lock briefly and return immediately; no lock is
/// held across a simulated execution delay.
pub struct Scheduler {
    state: Arc<Mutex<SchedulerState>>,
    config: SchedulerConfig,
    outcome: Arc<dyn OutcomeDecider>,
}

impl Scheduler {
    pub fn new(
        workers: Vec<Worker>,
        config: SchedulerConfig,
        outcome: Arc<dyn OutcomeDecider>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState::new(workers))),
            config,
            outcome,
        }
    }

    /// Validate and record a new job, returning its id.
    pub async fn submit(&self, req: JobRequest) -> Result<JobId> {
        let target = req.target.clone();
        let id = self.state.lock().await.admit(req)?;
        info!(job_id = %id, target = %target, "job submitted");
        Ok(id)
    }

    /// Fetch a snapshot of one job.
    pub async fn job(&self, id: &JobId) -> Result<Job> {
        self.state
            .lock()
            .await
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("job {id} not found")))
    }

    /// Snapshot of every job ever submitted, in indeterminate order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.state.lock().await.store.snapshot()
    }

    /// Snapshot of the worker pool.
    pub async fn workers(&self) -> Vec<Worker> {
        self.state.lock().await.pool.snapshot()
    }

    /// One dispatch pass: match idle workers to eligible queued jobs, then
    /// schedule a simulated execution for each match. Returns the number of
    /// jobs dispatched.
    pub async fn dispatch_once(&self) -> usize {
        let assignments = self.state.lock().await.match_idle_workers();
        let dispatched = assignments.len();
        for assignment in assignments {
            info!(job_id = %assignment.job_id, worker_id = %assignment.worker_id,
                "job dispatched");
            tokio::spawn(simulate_execution(
                Arc::clone(&self.state),
                Arc::clone(&self.outcome),
                self.config.retry_limit,
                assignment,
            ));
        }
        dispatched
    }

    /// Spawn the periodic dispatch loop.
    pub fn run(self: Arc<Self>) -> JoinHandle<()> {
        info!(tick = ?self.config.tick_interval, "starting dispatcher");
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.config.tick_interval);
            loop {
                tick.tick().await;
                self.dispatch_once().await;
            }
        })
    }
}

/// Model one execution: wait out the simulated run time, then settle the
/// job with a fresh lookup from the store. Carries only the assignment's
/// ids, never a live job reference.
async fn simulate_execution(
    state: Arc<Mutex<SchedulerState>>,
    outcome: Arc<dyn OutcomeDecider>,
    retry_limit: u32,
    assignment: Assignment,
) {
    tokio::time::sleep(outcome.execution_delay()).await;
    let success_draw = outcome.draw_success();
    let settled = state
        .lock()
        .await
        .settle(&assignment, success_draw, retry_limit);
    match settled {
        Ok(JobStatus::Queued) => {
            warn!(job_id = %assignment.job_id, worker_id = %assignment.worker_id,
                "execution failed, job requeued");
        }
        Ok(status) => {
            info!(job_id = %assignment.job_id, worker_id = %assignment.worker_id,
                %status, "job settled");
        }
        Err(e) => {
            error!(job_id = %assignment.job_id, worker_id = %assignment.worker_id,
                error = %e, "failed to settle job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FixedOutcome;
    use std::time::Duration;

    fn request(app_version: &str, target: &str) -> JobRequest {
        JobRequest {
            org_id: "qa-team".to_string(),
            app_version_id: app_version.to_string(),
            test_path: "tests/onboarding.spec".to_string(),
            priority: None,
            target: target.to_string(),
        }
    }

    fn scheduler(workers: Vec<Worker>, outcome: FixedOutcome) -> Scheduler {
        Scheduler::new(workers, SchedulerConfig::default(), Arc::new(outcome))
    }

    fn instant_success() -> FixedOutcome {
        FixedOutcome::new(true, Duration::ZERO)
    }

    /// Wait for spawned completion tasks to run.
    async fn drain() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn submit_and_lookup_round_trip() {
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], instant_success());
        let id = scheduler.submit(request("v1", "emulator")).await.unwrap();

        let job = scheduler.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.retries, 0);
        assert_eq!(job.priority, "normal");
        assert_eq!(scheduler.jobs().await.len(), 1);
    }

    #[tokio::test]
    async fn submit_rejects_malformed_requests() {
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], instant_success());
        let mut req = request("v1", "emulator");
        req.target = String::new();

        let err = scheduler.submit(req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(scheduler.jobs().await.is_empty());
    }

    #[tokio::test]
    async fn lookup_of_unknown_job_is_not_found() {
        let scheduler = scheduler(vec![], instant_success());
        let err = scheduler.job(&JobId::new()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn dispatch_matches_capability_tags() {
        // Long delay keeps the job visibly running.
        let outcome = FixedOutcome::new(true, Duration::from_secs(60));
        let scheduler = scheduler(
            vec![
                Worker::new("worker1", "emulator"),
                Worker::new("worker2", "device"),
            ],
            outcome,
        );
        let id = scheduler.submit(request("v1", "device")).await.unwrap();

        assert_eq!(scheduler.dispatch_once().await, 1);

        let job = scheduler.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.started_at.is_some());
        assert_eq!(job.assigned_worker.as_deref(), Some("worker2"));

        let workers = scheduler.workers().await;
        assert!(!workers.iter().find(|w| w.id == "worker1").unwrap().busy);
        assert!(workers.iter().find(|w| w.id == "worker2").unwrap().busy);
    }

    #[tokio::test]
    async fn one_worker_serves_one_job_at_a_time() {
        let outcome = FixedOutcome::new(true, Duration::from_secs(60));
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], outcome);
        let first = scheduler.submit(request("v1", "emulator")).await.unwrap();
        let second = scheduler.submit(request("v1", "emulator")).await.unwrap();

        assert_eq!(scheduler.dispatch_once().await, 1);
        // The only worker is busy; the second job stays queued.
        assert_eq!(scheduler.dispatch_once().await, 0);

        assert_eq!(scheduler.job(&first).await.unwrap().status, JobStatus::Running);
        assert_eq!(scheduler.job(&second).await.unwrap().status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn first_visited_group_wins_across_app_versions() {
        let outcome = FixedOutcome::new(true, Duration::from_secs(60));
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], outcome);

        // v1's group is created first; its emulator job is submitted after
        // v2's and still wins the scan.
        scheduler.submit(request("v1", "device")).await.unwrap();
        let v2_job = scheduler.submit(request("v2", "emulator")).await.unwrap();
        let v1_job = scheduler.submit(request("v1", "emulator")).await.unwrap();

        assert_eq!(scheduler.dispatch_once().await, 1);
        assert_eq!(scheduler.job(&v1_job).await.unwrap().status, JobStatus::Running);
        assert_eq!(scheduler.job(&v2_job).await.unwrap().status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn successful_execution_completes_and_frees_the_worker() {
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], instant_success());
        let id = scheduler.submit(request("v1", "emulator")).await.unwrap();

        assert_eq!(scheduler.dispatch_once().await, 1);
        drain().await;

        let job = scheduler.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.retries, 0);
        assert!(job.assigned_worker.is_none());
        assert!(job.submitted_at <= job.started_at.unwrap());
        assert!(job.started_at.unwrap() <= job.completed_at.unwrap());
        assert!(!scheduler.workers().await[0].busy);
    }

    #[tokio::test]
    async fn failed_execution_requeues_with_incremented_retries() {
        let outcome = FixedOutcome::scripted([false], true, Duration::ZERO);
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], outcome);
        let id = scheduler.submit(request("v1", "emulator")).await.unwrap();

        assert_eq!(scheduler.dispatch_once().await, 1);
        drain().await;

        let job = scheduler.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.retries, 1);
        assert!(job.completed_at.is_none());
        assert!(!scheduler.workers().await[0].busy);

        // Requeued job is dispatched again and completes on the second run.
        assert_eq!(scheduler.dispatch_once().await, 1);
        drain().await;
        assert_eq!(scheduler.job(&id).await.unwrap().status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn exhausted_retry_budget_forces_success() {
        // Every draw fails; the budget caps failures, not successes.
        let outcome = FixedOutcome::new(false, Duration::ZERO);
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], outcome);
        let id = scheduler.submit(request("v1", "emulator")).await.unwrap();

        assert_eq!(scheduler.dispatch_once().await, 1);
        drain().await;
        assert_eq!(scheduler.job(&id).await.unwrap().retries, 1);

        assert_eq!(scheduler.dispatch_once().await, 1);
        drain().await;

        let job = scheduler.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.retries, 1);
    }

    #[tokio::test]
    async fn settling_a_non_running_job_still_frees_the_worker() {
        let scheduler = scheduler(vec![Worker::new("worker1", "emulator")], instant_success());
        let id = scheduler.submit(request("v1", "emulator")).await.unwrap();

        let mut state = scheduler.state.lock().await;
        let assignments = state.match_idle_workers();
        assert_eq!(assignments.len(), 1);

        // Corrupt the record behind the assignment's back.
        state.store.get_mut(&id).unwrap().status = JobStatus::Completed;

        let err = state.settle(&assignments[0], true, 1).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert_eq!(state.pool.idle().len(), 1);
    }
}
