//! Error type surfaced by the batch engine.
//!
//! Transport failures are not here: they are recorded per item (see
//! `fetcher::FetchFailure`) and never escape a dispatch run.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    /// Malformed batch configuration (mismatched inputs, zero workers, unencodable locator).
    /// Raised before any work starts and never retried.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Ledger or output file I/O failed.
    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BatchError {
    pub(crate) fn io(context: &'static str, path: &Path, source: std::io::Error) -> Self {
        BatchError::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        BatchError::InvariantViolation(msg.into())
    }
}

pub type Result<T, E = BatchError> = std::result::Result<T, E>;
