//! Worker loop and the per-item protocol: fetch, persist, log, update budget.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::batch::Batch;
use crate::error::BatchError;
use crate::fetcher::{ErrorKind, FetchFailure, FetchSession, Fetcher};
use crate::ledger::LedgerEntry;
use crate::storage;
use crate::workset::WorkItem;

use super::budget::{BudgetAction, ErrorBudget};
use super::dispatch::{RunCounters, WorkQueue};
use super::progress::{ProgressEvent, ProgressSink};

/// Everything a worker shares with its siblings for one run.
pub(super) struct WorkerContext<'a, F: Fetcher> {
    pub(super) batch: &'a Batch,
    pub(super) fetcher: &'a F,
    pub(super) queue: &'a WorkQueue,
    pub(super) budget: &'a ErrorBudget,
    pub(super) progress: &'a ProgressSink,
    pub(super) counters: &'a RunCounters,
    pub(super) stop: &'a AtomicBool,
}

/// Why an item ended as a failure.
enum ItemFailure {
    Fetch(FetchFailure),
    /// Body was fetched but could not be written.
    Persist { status: u32, error: BatchError },
}

impl ItemFailure {
    fn status(&self) -> Option<u32> {
        match self {
            ItemFailure::Fetch(f) => f.status,
            ItemFailure::Persist { status, .. } => Some(*status),
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            ItemFailure::Fetch(f) => f.kind,
            ItemFailure::Persist { .. } => ErrorKind::Other,
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemFailure::Fetch(e) => write!(f, "{}", e),
            ItemFailure::Persist { error, .. } => write!(f, "storage: {}", error),
        }
    }
}

/// Pull items until the queue is empty or a stop is requested.
/// The session lives exactly as long as this worker.
pub(super) fn run_worker<F: Fetcher>(ctx: &WorkerContext<'_, F>, id: usize) {
    let mut session = ctx.fetcher.open_session();
    let mut handled = 0usize;
    loop {
        if ctx.stop.load(Ordering::Relaxed) {
            tracing::debug!(worker = id, "stop requested");
            break;
        }
        let Some(item) = ctx.queue.next() else {
            break;
        };
        process_item(ctx, &mut session, item, id);
        handled += 1;
    }
    tracing::debug!(worker = id, handled, "worker exiting");
}

fn process_item<F: Fetcher, S: FetchSession>(
    ctx: &WorkerContext<'_, F>,
    session: &mut S,
    item: &WorkItem,
    worker: usize,
) {
    let timeout = ctx.batch.options().timeout;
    let result = session
        .fetch(&item.locator, timeout)
        .map_err(ItemFailure::Fetch)
        .and_then(|fetched| {
            storage::persist(&fetched.bytes, &item.destination)
                .map(|()| fetched.bytes.len() as u64)
                .map_err(|error| ItemFailure::Persist {
                    status: fetched.status,
                    error,
                })
        });

    match result {
        Ok(bytes) => {
            append(ctx, LedgerEntry::success(item.locator.as_str()));
            ctx.budget.record_success();
            ctx.counters.succeeded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(worker, locator = %item.locator, bytes, "fetched");
            ctx.progress.item_done(ProgressEvent::Succeeded {
                locator: item.locator.clone(),
                bytes,
            });
        }
        Err(failure) => {
            append(ctx, LedgerEntry::failure(item.locator.as_str()));
            ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                worker,
                locator = %item.locator,
                status = ?failure.status(),
                "fetch failed: {}",
                failure
            );
            ctx.progress.item_done(ProgressEvent::Failed {
                locator: item.locator.clone(),
                status: failure.status(),
                kind: failure.kind(),
                cause: failure.to_string(),
            });
            if let BudgetAction::Cooldown(duration) = ctx.budget.record_failure() {
                ctx.counters.cooldowns.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    worker,
                    last_status = ?failure.status(),
                    last_locator = %item.locator,
                    cooldown_secs = duration.as_secs_f64(),
                    "error threshold reached; cooling down this worker"
                );
                ctx.progress.emit(ProgressEvent::Cooldown { worker, duration });
                cool_down(ctx.stop, duration);
            }
        }
    }
}

/// Granularity at which a cooling-down worker re-checks the stop flag.
const COOLDOWN_SLICE: Duration = Duration::from_millis(200);

/// Sleep for `duration`, returning early once `stop` is set.
fn cool_down(stop: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    while !stop.load(Ordering::Relaxed) {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return;
        }
        std::thread::sleep(left.min(COOLDOWN_SLICE));
    }
    tracing::debug!("cooldown cut short by stop request");
}

/// Ledger write failures are logged and the worker moves on; the item stays
/// pending for the next run.
fn append<F: Fetcher>(ctx: &WorkerContext<'_, F>, entry: LedgerEntry) {
    if let Err(e) = ctx.batch.ledger().append(&entry) {
        tracing::warn!(locator = %entry.locator, "ledger append failed: {}", e);
    }
}
