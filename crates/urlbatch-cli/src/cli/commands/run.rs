//! `urlbatch run` – download every pending URL into the output folder.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use urlbatch_core::config::BatchConfig;
use urlbatch_core::fetcher::CurlFetcher;
use urlbatch_core::{Batch, BatchOptions, Dispatcher, ProgressEvent};

use crate::cli::input::{load_batch_input, merge_headers};
use crate::cli::BatchInput;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub workers: Option<usize>,
    pub timeout: Option<u64>,
    pub threshold: Option<u32>,
    pub cooldown: Option<u64>,
    pub headers: Vec<String>,
}

impl RunOverrides {
    fn options(&self, cfg: &BatchConfig) -> BatchOptions {
        let mut options = BatchOptions::from(cfg);
        if let Some(secs) = self.timeout {
            options.timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = self.threshold {
            options.error_threshold = threshold;
        }
        if let Some(secs) = self.cooldown {
            options.cooldown = Duration::from_secs(secs);
        }
        options
    }
}

pub async fn run_batch(cfg: &BatchConfig, input: &BatchInput, overrides: RunOverrides) -> Result<()> {
    let workers = overrides.workers.unwrap_or(cfg.workers);
    if workers < 1 {
        bail!("--workers must be at least 1");
    }
    let options = overrides.options(cfg);
    let headers = merge_headers(&cfg.headers, &overrides.headers)?;
    let fetcher = CurlFetcher::new(&headers)?
        .with_connect_timeout(Duration::from_secs(cfg.connect_timeout_secs));

    let (locators, destinations) = load_batch_input(input)?;
    let batch = Batch::new(locators, destinations, &input.out_dir, options)?;
    let remaining = batch.remaining_count()?;
    println!(
        "{} of {} item(s) remaining in {}",
        remaining,
        batch.work().len(),
        batch.out_root().display()
    );
    if remaining == 0 {
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_on_signal = Arc::clone(&stop);
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupt: finishing in-flight items, then stopping");
            stop_on_signal.store(true, Ordering::Relaxed);
        }
    });

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressEvent>(1024);
    let progress_handle = tokio::spawn(async move {
        let mut stderr = std::io::stderr();
        while let Some(event) = progress_rx.recv().await {
            match event {
                ProgressEvent::Succeeded { .. } => {
                    let _ = write!(stderr, "o");
                }
                ProgressEvent::Failed { .. } => {
                    let _ = write!(stderr, "x");
                }
                ProgressEvent::Milestone { processed } => {
                    let _ = writeln!(stderr, "\n# processed url: {}...", processed);
                }
                ProgressEvent::Cooldown { worker, duration } => {
                    let _ = writeln!(
                        stderr,
                        "\n# worker {} cooling down for {}s",
                        worker,
                        duration.as_secs()
                    );
                }
            }
            let _ = stderr.flush();
        }
        let _ = writeln!(stderr);
    });

    let summary = tokio::task::spawn_blocking(move || {
        Dispatcher::new(&fetcher)
            .with_progress(progress_tx)
            .with_stop_flag(stop)
            .run(&batch, workers)
    })
    .await
    .context("dispatcher task panicked")??;

    signal_handle.abort();
    // Channel closes once the dispatcher (and its sender) is dropped.
    let _ = progress_handle.await;

    println!(
        "done: {} succeeded, {} failed, {} cooldown(s), {} left unprocessed",
        summary.succeeded,
        summary.failed,
        summary.cooldowns,
        summary.pending - summary.processed()
    );
    Ok(())
}
