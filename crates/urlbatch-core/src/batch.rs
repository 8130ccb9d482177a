//! A batch: its work items, output root, ledger, and run options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::BatchConfig;
use crate::error::{BatchError, Result};
use crate::ledger::{self, Ledger, LedgerSummary, LEDGER_FILENAME};
use crate::url_model;
use crate::workset::{WorkItem, WorkSet};

/// Per-run tuning shared by every worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Consecutive failures that trigger a cooldown (0 = every failure).
    pub error_threshold: u32,
    /// Sleep applied to the worker that trips the threshold.
    pub cooldown: Duration,
    /// Time limit for one fetch.
    pub timeout: Duration,
    /// Emit a milestone every N processed items (0 disables).
    pub milestone_every: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(cfg: &BatchConfig) -> Self {
        Self {
            error_threshold: cfg.error_threshold,
            cooldown: Duration::from_secs(cfg.cooldown_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            milestone_every: cfg.milestone_every,
        }
    }
}

/// Read-only view of a batch's progress, see [`Batch::inspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStatus {
    pub items: usize,
    pub remaining: usize,
    pub ledger: LedgerSummary,
}

/// Owns the ledger exclusively; nothing else appends to it while the batch lives.
#[derive(Debug)]
pub struct Batch {
    out_root: PathBuf,
    work: WorkSet,
    ledger: Ledger,
    options: BatchOptions,
}

impl Batch {
    /// Build a batch naming destinations with [`url_model::derive_destination`]
    /// when `destinations` is `None`.
    pub fn new(
        locators: Vec<String>,
        destinations: Option<Vec<PathBuf>>,
        out_root: impl Into<PathBuf>,
        options: BatchOptions,
    ) -> Result<Self> {
        Self::with_naming(
            locators,
            destinations,
            out_root,
            options,
            url_model::derive_destination,
        )
    }

    /// Like [`Batch::new`] with a custom naming function.
    ///
    /// Creates the output root if missing and opens (or creates) its ledger.
    pub fn with_naming<F>(
        locators: Vec<String>,
        destinations: Option<Vec<PathBuf>>,
        out_root: impl Into<PathBuf>,
        options: BatchOptions,
        derive: F,
    ) -> Result<Self>
    where
        F: Fn(&str, &Path) -> PathBuf,
    {
        let out_root = out_root.into();
        let work = WorkSet::build(locators, destinations, &out_root, derive)?;

        if !out_root.exists() {
            tracing::info!(path = %out_root.display(), "output folder does not exist; creating it");
        }
        std::fs::create_dir_all(&out_root)
            .map_err(|e| BatchError::io("create output root", &out_root, e))?;
        let ledger = Ledger::open(&out_root.join(LEDGER_FILENAME))?;

        tracing::debug!(
            items = work.len(),
            ledger = %ledger.path().display(),
            "batch constructed"
        );
        Ok(Self {
            out_root,
            work,
            ledger,
            options,
        })
    }

    /// Count remaining work for `out_root` without creating the folder or its ledger.
    pub fn inspect(
        locators: Vec<String>,
        destinations: Option<Vec<PathBuf>>,
        out_root: &Path,
    ) -> Result<BatchStatus> {
        let work = WorkSet::build(locators, destinations, out_root, url_model::derive_destination)?;
        let entries = ledger::load_existing(&out_root.join(LEDGER_FILENAME))?;
        Ok(BatchStatus {
            items: work.len(),
            remaining: work.pending(&entries).len(),
            ledger: LedgerSummary::of(&entries),
        })
    }

    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn work(&self) -> &WorkSet {
        &self.work
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Items not yet recorded in the ledger, re-read from disk.
    pub fn pending(&self) -> Result<Vec<WorkItem>> {
        let entries = self.ledger.load()?;
        Ok(self.work.pending(&entries))
    }

    /// Number of pending items, recomputed against the current ledger.
    pub fn remaining_count(&self) -> Result<usize> {
        Ok(self.pending()?.len())
    }
}
