//! CLI command handlers, one file per command.

mod run;
mod status;

pub use run::{run_batch, RunOverrides};
pub use status::run_status;
