use std::path::Path;

use log::{error, info};
use thiserror::Error;

use crate::{
    ledger::{Ledger, LedgerError},
    settlement::{Settlement, SettlementError},
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

// The single outward-facing operation: failures from any stage end up here
// as a logged diagnostic and are never propagated to the caller.
pub fn run(input: &Path, output: &Path) {
    if let Err(err) = try_run(input, output) {
        error!("failed to settle expense ledger: {err}");
    }
}

fn try_run(input: &Path, output: &Path) -> Result<(), PipelineError> {
    let ledger = Ledger::from_path(input)?;
    let settlement = Settlement::from_ledger(&ledger)?;

    if settlement.is_empty() {
        info!("every participant already paid the average share, nothing to write");
        return Ok(());
    }
    settlement.to_file(output)?;

    Ok(())
}
