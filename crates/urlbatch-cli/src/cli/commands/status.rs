//! `urlbatch status` – remaining work and ledger totals for an output folder.

use anyhow::Result;
use urlbatch_core::Batch;

use crate::cli::input::load_batch_input;
use crate::cli::BatchInput;

pub fn run_status(input: &BatchInput) -> Result<()> {
    let (locators, destinations) = load_batch_input(input)?;
    let status = Batch::inspect(locators, destinations, &input.out_dir)?;

    println!("output:    {}", input.out_dir.display());
    println!("items:     {}", status.items);
    println!("remaining: {}", status.remaining);
    println!(
        "ledger:    {} entries ({} ok, {} failed)",
        status.ledger.total(),
        status.ledger.succeeded,
        status.ledger.failed
    );
    Ok(())
}
