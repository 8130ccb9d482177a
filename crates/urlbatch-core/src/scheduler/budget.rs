//! Consecutive-failure breaker shared by every worker of a run.
//!
//! The streak counts failures across the whole pool since the last success.
//! When it reaches the threshold the worker that recorded the failure gets a
//! cooldown and the streak starts over; the other workers keep going.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// What the worker should do after recording a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetAction {
    Continue,
    /// Sleep this worker for the duration before pulling the next item.
    Cooldown(Duration),
}

#[derive(Debug)]
pub struct ErrorBudget {
    threshold: u32,
    cooldown: Duration,
    consecutive: AtomicU32,
}

impl ErrorBudget {
    /// `threshold` of 0 trips on every failure.
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            consecutive: AtomicU32::new(0),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Current failure streak.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive.load(Ordering::Acquire)
    }

    pub fn record_success(&self) {
        self.consecutive.store(0, Ordering::Release);
    }

    /// Count one failure; trips (and resets the streak) once it reaches the threshold.
    pub fn record_failure(&self) -> BudgetAction {
        let mut current = self.consecutive.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(1);
            let tripped = next >= self.threshold;
            let store = if tripped { 0 } else { next };
            match self.consecutive.compare_exchange_weak(
                current,
                store,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) if tripped => return BudgetAction::Cooldown(self.cooldown),
                Ok(_) => return BudgetAction::Continue,
                Err(actual) => current = actual,
            }
        }
    }
}
