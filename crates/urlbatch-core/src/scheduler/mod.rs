//! Dispatch of a batch across a fixed pool of workers.
//!
//! Workers pull pending items from a shared queue, fetch, persist, append to
//! the ledger, and feed the shared [`ErrorBudget`]. Progress leaves through a
//! non-blocking channel so reporting never stalls a worker.

mod budget;
mod dispatch;
mod progress;
mod worker;

pub use budget::{BudgetAction, ErrorBudget};
pub use dispatch::{Dispatcher, RunSummary};
pub use progress::ProgressEvent;
