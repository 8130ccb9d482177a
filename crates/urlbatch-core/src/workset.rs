//! Work items for a batch and the ledger filter that yields the pending subset.
//!
//! The filter pairs ledger entries off against work items one for one: a
//! locator listed twice in the input needs two recorded attempts before both
//! copies are considered done.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{BatchError, Result};
use crate::ledger::{self, LedgerEntry};

/// One (locator, destination) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub locator: String,
    pub destination: PathBuf,
}

/// All work items of a batch, before ledger filtering.
#[derive(Debug, Clone, Default)]
pub struct WorkSet {
    items: Vec<WorkItem>,
}

impl WorkSet {
    /// Build the work items for a batch.
    ///
    /// With explicit `destinations`, the lists must have equal length and every
    /// pair is kept as given (no dedup). Relative destinations are placed under
    /// `out_root`. Without destinations, locators are deduplicated (first
    /// occurrence wins) and `derive` names each destination.
    ///
    /// Locators the ledger cannot record (empty, or containing a tab or line
    /// break) are rejected up front.
    pub fn build<F>(
        locators: Vec<String>,
        destinations: Option<Vec<PathBuf>>,
        out_root: &Path,
        derive: F,
    ) -> Result<Self>
    where
        F: Fn(&str, &Path) -> PathBuf,
    {
        for locator in &locators {
            ledger::validate_locator(locator)?;
        }
        let items = match destinations {
            Some(destinations) => {
                if destinations.len() != locators.len() {
                    return Err(BatchError::invariant(format!(
                        "{} locators but {} destinations",
                        locators.len(),
                        destinations.len()
                    )));
                }
                locators
                    .into_iter()
                    .zip(destinations)
                    .map(|(locator, dest)| WorkItem {
                        locator,
                        destination: out_root.join(dest),
                    })
                    .collect()
            }
            None => {
                let mut seen = HashSet::with_capacity(locators.len());
                locators
                    .into_iter()
                    .filter(|l| seen.insert(l.clone()))
                    .map(|locator| {
                        let destination = derive(&locator, out_root);
                        WorkItem {
                            locator,
                            destination,
                        }
                    })
                    .collect()
            }
        };
        Ok(Self { items })
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items not yet accounted for by `entries`, in input order.
    pub fn pending(&self, entries: &[LedgerEntry]) -> Vec<WorkItem> {
        let mut attempts: HashMap<&str, usize> = HashMap::new();
        for entry in entries {
            *attempts.entry(entry.locator.as_str()).or_insert(0) += 1;
        }
        self.items
            .iter()
            .filter(|item| match attempts.get_mut(item.locator.as_str()) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    false
                }
                _ => true,
            })
            .cloned()
            .collect()
    }
}
