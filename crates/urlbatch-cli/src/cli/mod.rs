//! CLI for the urlbatch resumable batch downloader.

mod commands;
mod input;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use urlbatch_core::config;

use commands::{run_batch, run_status};

/// Top-level CLI for urlbatch.
#[derive(Debug, Parser)]
#[command(name = "urlbatch")]
#[command(about = "urlbatch: resumable concurrent batch downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Input shared by `run` and `status`.
#[derive(Debug, Args)]
pub struct BatchInput {
    /// Output folder; holds the downloaded files and the `downloaded.log` ledger.
    pub out_dir: PathBuf,

    /// File with one URL per line (blank lines and `#` comments ignored).
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: PathBuf,

    /// File with one output name per URL line. Disables URL deduplication.
    #[arg(long, value_name = "FILE")]
    pub names: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every URL not yet recorded in the output folder's ledger.
    Run {
        #[command(flatten)]
        batch: BatchInput,

        /// Number of concurrent workers (default from config).
        #[arg(long, short = 'w', value_name = "N")]
        workers: Option<usize>,

        /// Per-request time limit in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Consecutive failures before a worker cools down (0 = every failure).
        #[arg(long, value_name = "N")]
        threshold: Option<u32>,

        /// Cooldown length in seconds.
        #[arg(long, value_name = "SECS")]
        cooldown: Option<u64>,

        /// Extra request header, `Name: value`. Repeatable; overrides config headers.
        #[arg(long = "header", short = 'H', value_name = "HEADER")]
        headers: Vec<String>,
    },

    /// Show how many URLs remain and the ledger totals.
    Status {
        #[command(flatten)]
        batch: BatchInput,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                batch,
                workers,
                timeout,
                threshold,
                cooldown,
                headers,
            } => {
                let overrides = commands::RunOverrides {
                    workers,
                    timeout,
                    threshold,
                    cooldown,
                    headers,
                };
                run_batch(&cfg, &batch, overrides).await?
            }
            CliCommand::Status { batch } => run_status(&batch)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
