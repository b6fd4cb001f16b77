//! Simulated execution outcomes.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;

/// Decides how long a simulated execution runs and whether its success
/// draw passes.
///
/// Injected into the scheduler so the random source can be swapped for a
/// deterministic one in tests.
pub trait OutcomeDecider: Send + Sync {
    /// Simulated execution time for one run.
    fn execution_delay(&self) -> Duration;

    /// Whether the run's success draw passes. A failing draw may still be
    /// overridden by the retry budget.
    fn draw_success(&self) -> bool;
}

/// Production decider: uniformly random delay, fixed success probability.
#[derive(Debug, Clone)]
pub struct RandomOutcome {
    /// Probability in `[0, 1]` that a single run succeeds.
    pub success_rate: f64,
    /// Simulated execution time, drawn uniformly from this range (ms).
    pub delay_ms: Range<u64>,
}

impl Default for RandomOutcome {
    fn default() -> Self {
        Self {
            success_rate: 0.8,
            delay_ms: 3_000..6_000,
        }
    }
}

impl OutcomeDecider for RandomOutcome {
    fn execution_delay(&self) -> Duration {
        Duration::from_millis(rand::rng().random_range(self.delay_ms.clone()))
    }

    fn draw_success(&self) -> bool {
        rand::rng().random_bool(self.success_rate)
    }
}

/// Deterministic decider: fixed delay, scripted draws.
///
/// Draws are played back in order; once the script is exhausted every
/// further draw returns the fallback value.
#[derive(Debug)]
pub struct FixedOutcome {
    delay: Duration,
    draws: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl FixedOutcome {
    /// Every run takes `delay` and draws `succeed`.
    pub fn new(succeed: bool, delay: Duration) -> Self {
        Self {
            delay,
            draws: Mutex::new(VecDeque::new()),
            fallback: succeed,
        }
    }

    /// Play out `draws` in order, then keep returning `fallback`.
    pub fn scripted(draws: impl IntoIterator<Item = bool>, fallback: bool, delay: Duration) -> Self {
        Self {
            delay,
            draws: Mutex::new(draws.into_iter().collect()),
            fallback,
        }
    }
}

impl OutcomeDecider for FixedOutcome {
    fn execution_delay(&self) -> Duration {
        self.delay
    }

    fn draw_success(&self) -> bool {
        self.draws
            .lock()
            .expect("draw script lock poisoned")
            .pop_front()
            .unwrap_or(self.fallback)
    }
}
