//! Fixed worker pool over a batch's pending items.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::Sender;

use crate::batch::Batch;
use crate::error::{BatchError, Result};
use crate::fetcher::Fetcher;
use crate::workset::WorkItem;

use super::budget::ErrorBudget;
use super::progress::{ProgressEvent, ProgressSink};
use super::worker::{self, WorkerContext};

/// Counts for one `run` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pending items when the run started.
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cooldowns: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Shared pull queue: each index is handed out exactly once.
#[derive(Debug)]
pub(super) struct WorkQueue {
    items: Vec<WorkItem>,
    next: AtomicUsize,
}

impl WorkQueue {
    pub(super) fn new(items: Vec<WorkItem>) -> Self {
        Self {
            items,
            next: AtomicUsize::new(0),
        }
    }

    pub(super) fn next(&self) -> Option<&WorkItem> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.items.get(index)
    }
}

/// Per-run counters updated by workers.
#[derive(Debug, Default)]
pub(super) struct RunCounters {
    pub(super) succeeded: AtomicUsize,
    pub(super) failed: AtomicUsize,
    pub(super) cooldowns: AtomicUsize,
}

/// Runs batches through a [`Fetcher`], optionally reporting progress and
/// honoring a stop flag.
pub struct Dispatcher<'f, F: Fetcher> {
    fetcher: &'f F,
    progress_tx: Option<Sender<ProgressEvent>>,
    stop: Option<Arc<AtomicBool>>,
}

impl<'f, F: Fetcher> Dispatcher<'f, F> {
    pub fn new(fetcher: &'f F) -> Self {
        Self {
            fetcher,
            progress_tx: None,
            stop: None,
        }
    }

    /// Send progress events to `tx` (dropped when the channel is full).
    pub fn with_progress(mut self, tx: Sender<ProgressEvent>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// When `stop` becomes true, workers finish their current item and exit.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Process every pending item of `batch` with exactly `worker_count` workers.
    ///
    /// Blocks until all workers have exited. Item failures are recorded in
    /// the ledger and the summary; only an invalid `worker_count` or an
    /// unreadable ledger at start-up is returned as an error.
    pub fn run(&self, batch: &Batch, worker_count: usize) -> Result<RunSummary> {
        if worker_count < 1 {
            return Err(BatchError::invariant("worker_count must be at least 1"));
        }

        let pending = batch.pending()?;
        let pending_count = pending.len();
        let options = batch.options();
        tracing::info!(
            pending = pending_count,
            workers = worker_count,
            out_root = %batch.out_root().display(),
            "dispatch starting"
        );

        let queue = WorkQueue::new(pending);
        let budget = ErrorBudget::new(options.error_threshold, options.cooldown);
        let progress = ProgressSink::new(self.progress_tx.clone(), options.milestone_every);
        let counters = RunCounters::default();
        let no_stop = AtomicBool::new(false);
        let stop = self.stop.as_deref().unwrap_or(&no_stop);

        let ctx = WorkerContext {
            batch,
            fetcher: self.fetcher,
            queue: &queue,
            budget: &budget,
            progress: &progress,
            counters: &counters,
            stop,
        };

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..worker_count)
                .map(|id| {
                    let ctx = &ctx;
                    std::thread::Builder::new()
                        .name(format!("urlbatch-worker-{id}"))
                        .spawn_scoped(scope, move || worker::run_worker(ctx, id))
                })
                .collect();
            for (id, handle) in handles.into_iter().enumerate() {
                match handle {
                    Ok(h) => {
                        if h.join().is_err() {
                            tracing::warn!(worker = id, "worker panicked");
                        }
                    }
                    Err(e) => tracing::warn!(worker = id, "failed to spawn worker: {}", e),
                }
            }
        });

        let summary = RunSummary {
            pending: pending_count,
            succeeded: counters.succeeded.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            cooldowns: counters.cooldowns.load(Ordering::Relaxed),
        };
        tracing::info!(
            processed = progress.processed(),
            succeeded = summary.succeeded,
            failed = summary.failed,
            cooldowns = summary.cooldowns,
            "dispatch finished"
        );
        Ok(summary)
    }
}
