//! Append-only outcome ledger: the durable source of truth for resuming a batch.
//!
//! One line per fetch attempt, `locator<TAB>o` for success and `locator<TAB>x`
//! for failure, in completion order. Entries are never edited or removed, so
//! the file is safe to `tail` while a run is in progress. A crash mid-write can
//! leave a trailing line without its newline; the loader ignores it and
//! [`Ledger::open`] truncates it before appending again.

mod codec;

pub use codec::validate_locator;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{BatchError, Result};

/// File name of the ledger inside the batch output root.
pub const LEDGER_FILENAME: &str = "downloaded.log";

/// Result of one fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// One recorded attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub locator: String,
    pub outcome: Outcome,
}

impl LedgerEntry {
    pub fn success(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            outcome: Outcome::Success,
        }
    }

    pub fn failure(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            outcome: Outcome::Failure,
        }
    }
}

/// Totals over all recorded attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl LedgerSummary {
    pub fn of(entries: &[LedgerEntry]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            match entry.outcome {
                Outcome::Success => summary.succeeded += 1,
                Outcome::Failure => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Open ledger file. `append` is safe to call from every worker at once; each
/// call writes and syncs one whole line under the lock.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    file: Mutex<File>,
}

impl Ledger {
    /// Open (or create) the ledger at `path`, dropping a torn trailing line if present.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| BatchError::io("open ledger", path, e))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| BatchError::io("read ledger", path, e))?;
        let valid_len = codec::complete_prefix_len(&bytes);
        if valid_len < bytes.len() {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = bytes.len() - valid_len,
                "ledger ends with an incomplete line; truncating it"
            );
            file.set_len(valid_len as u64)
                .and_then(|()| file.sync_data())
                .map_err(|e| BatchError::io("truncate torn ledger tail", path, e))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush it to disk before returning.
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let line = codec::encode(entry)?;
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .map_err(|e| BatchError::io("append to ledger", &self.path, e))?;
        file.sync_data()
            .map_err(|e| BatchError::io("sync ledger", &self.path, e))?;
        Ok(())
    }

    /// Re-read all entries from disk.
    pub fn load(&self) -> Result<Vec<LedgerEntry>> {
        load(&self.path)
    }

    pub fn summary(&self) -> Result<LedgerSummary> {
        Ok(LedgerSummary::of(&self.load()?))
    }
}

/// Load all complete entries from `path`.
///
/// A missing file is created empty. A trailing line without a newline is
/// discarded; any other malformed line is reported as `InvalidData`.
pub fn load(path: &Path) -> Result<Vec<LedgerEntry>> {
    match read_entries(path)? {
        Some(entries) => Ok(entries),
        None => {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| BatchError::io("create ledger", path, e))?;
            Ok(Vec::new())
        }
    }
}

/// Like [`load`], but a missing file reads as empty and is not created.
pub fn load_existing(path: &Path) -> Result<Vec<LedgerEntry>> {
    Ok(read_entries(path)?.unwrap_or_default())
}

/// `None` when `path` does not exist.
fn read_entries(path: &Path) -> Result<Option<Vec<LedgerEntry>>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BatchError::io("read ledger", path, e)),
    };

    let complete = &bytes[..codec::complete_prefix_len(&bytes)];
    if complete.len() < bytes.len() {
        tracing::debug!(path = %path.display(), "ignoring incomplete trailing ledger line");
    }
    let text = std::str::from_utf8(complete).map_err(|e| {
        BatchError::io(
            "decode ledger",
            path,
            io::Error::new(io::ErrorKind::InvalidData, e),
        )
    })?;

    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry = codec::decode_line(line).ok_or_else(|| {
            BatchError::io(
                "parse ledger",
                path,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("corrupt ledger line {}: {:?}", index + 1, line),
                ),
            )
        })?;
        entries.push(entry);
    }
    Ok(Some(entries))
}
