mod ledger;
mod pipeline;
mod settlement;

pub use self::{
    ledger::{Ledger, LedgerError},
    pipeline::run,
    settlement::{Settlement, SettlementError, Transfer},
};
