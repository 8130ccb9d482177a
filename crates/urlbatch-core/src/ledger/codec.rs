//! Line codec for ledger entries: `locator<TAB>marker\n`.

use crate::error::{BatchError, Result};

use super::{LedgerEntry, Outcome};

const SUCCESS_MARKER: char = 'o';
const FAILURE_MARKER: char = 'x';

impl Outcome {
    /// Single-character marker written to the ledger.
    pub fn marker(self) -> char {
        match self {
            Outcome::Success => SUCCESS_MARKER,
            Outcome::Failure => FAILURE_MARKER,
        }
    }

    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            SUCCESS_MARKER => Some(Outcome::Success),
            FAILURE_MARKER => Some(Outcome::Failure),
            _ => None,
        }
    }
}

/// Check that `locator` can be written as one ledger line.
pub fn validate_locator(locator: &str) -> Result<()> {
    if locator.is_empty() {
        return Err(BatchError::invariant("ledger locator is empty"));
    }
    if locator.contains(['\t', '\n', '\r']) {
        return Err(BatchError::invariant(format!(
            "ledger locator contains a tab or line break: {:?}",
            locator
        )));
    }
    Ok(())
}

/// Encode one entry as a complete line (with trailing newline).
pub(crate) fn encode(entry: &LedgerEntry) -> Result<String> {
    validate_locator(&entry.locator)?;
    Ok(format!("{}\t{}\n", entry.locator, entry.outcome.marker()))
}

/// Decode one complete line (newline already stripped). `None` if malformed.
pub(crate) fn decode_line(line: &str) -> Option<LedgerEntry> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (locator, marker) = line.rsplit_once('\t')?;
    if locator.is_empty() {
        return None;
    }
    let mut chars = marker.chars();
    let outcome = Outcome::from_marker(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(LedgerEntry {
        locator: locator.to_string(),
        outcome,
    })
}

/// Length of the prefix of `bytes` made of complete lines (up to and including the last `\n`).
pub(crate) fn complete_prefix_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}
