pub mod config;
pub mod logging;

pub mod batch;
pub mod error;
pub mod fetcher;
pub mod ledger;
pub mod scheduler;
pub mod storage;
pub mod url_model;
pub mod workset;

pub use batch::{Batch, BatchOptions, BatchStatus};
pub use error::BatchError;
pub use ledger::{Ledger, LedgerEntry, Outcome};
pub use scheduler::{Dispatcher, ErrorBudget, ProgressEvent, RunSummary};
pub use workset::{WorkItem, WorkSet};
