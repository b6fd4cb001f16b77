//! Fixed worker pool.

use testmux_core::{Error, Result, Worker};

/// Fixed, statically configured set of workers. Never resized at runtime.
///
/// Acquire and release are fallible: flipping a busy flag the wrong way is
/// a scheduling bug and is surfaced as an invariant violation instead of
/// being silently absorbed.
#[derive(Debug, Default)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self { workers }
    }

    /// Clone out every idle worker, in pool order.
    pub fn idle(&self) -> Vec<Worker> {
        self.workers.iter().filter(|w| !w.busy).cloned().collect()
    }

    /// Clone out the whole pool, in pool order.
    pub fn snapshot(&self) -> Vec<Worker> {
        self.workers.to_vec()
    }

    /// Mark a worker busy. Fails if it is unknown or already busy.
    pub fn acquire(&mut self, id: &str) -> Result<()> {
        let worker = self.find_mut(id)?;
        if worker.busy {
            return Err(Error::InvariantViolation(format!(
                "worker {id} acquired while already busy"
            )));
        }
        worker.busy = true;
        Ok(())
    }

    /// Mark a worker idle. Fails if it is unknown or already idle.
    pub fn release(&mut self, id: &str) -> Result<()> {
        let worker = self.find_mut(id)?;
        if !worker.busy {
            return Err(Error::InvariantViolation(format!(
                "worker {id} released while already idle"
            )));
        }
        worker.busy = false;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Worker> {
        self.workers
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::InvariantViolation(format!("unknown worker {id}")))
    }
}
