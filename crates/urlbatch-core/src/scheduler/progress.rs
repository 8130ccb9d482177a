//! Progress events for observers (CLI printing, logs).
//!
//! Events are sent with `try_send`: a full or closed channel drops the event
//! rather than blocking the worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::Sender;

use crate::fetcher::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Item fetched, written, and logged.
    Succeeded { locator: String, bytes: u64 },
    /// Item failed and was logged as a failure.
    Failed {
        locator: String,
        status: Option<u32>,
        kind: ErrorKind,
        cause: String,
    },
    /// A worker tripped the error budget and is sleeping.
    Cooldown { worker: usize, duration: Duration },
    /// `processed` items have completed in this run (emitted every N items).
    Milestone { processed: u64 },
}

/// Shared by all workers of one run.
#[derive(Debug)]
pub(crate) struct ProgressSink {
    tx: Option<Sender<ProgressEvent>>,
    processed: AtomicU64,
    milestone_every: u64,
}

impl ProgressSink {
    pub(crate) fn new(tx: Option<Sender<ProgressEvent>>, milestone_every: u64) -> Self {
        Self {
            tx,
            processed: AtomicU64::new(0),
            milestone_every,
        }
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(event);
        }
    }

    /// Emit a terminal item event and, every `milestone_every` items, a milestone.
    pub(crate) fn item_done(&self, event: ProgressEvent) {
        self.emit(event);
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.milestone_every > 0 && processed % self.milestone_every == 0 {
            tracing::info!(processed, "batch milestone");
            self.emit(ProgressEvent::Milestone { processed });
        }
    }

    pub(crate) fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}
