//! Collaborator interfaces for execution and balance queries

use crate::gate::{ActionCall, Principal, TransactionLedger};
use thiserror::Error;

/// Failure reported by an action executor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Recipient refused transfer: {0}")]
    Refused(Principal),
    #[error("Balance overflow")]
    Overflow,
    #[error("Call rejected: {0}")]
    Rejected(String),
}

/// Performs the real-world effect of an approved transaction
///
/// The ledger has already marked the record executed when `dispatch` runs,
/// and passes itself back in so the executor may re-enter it. A dispatch
/// that returns an error must leave no effects of its own behind; the
/// ledger rolls back its side.
pub trait ActionExecutor {
    fn dispatch(
        &mut self,
        call: &ActionCall,
        ledger: &mut TransactionLedger,
    ) -> Result<(), DispatchError>;
}

impl<F> ActionExecutor for F
where
    F: FnMut(&ActionCall, &mut TransactionLedger) -> Result<(), DispatchError>,
{
    fn dispatch(
        &mut self,
        call: &ActionCall,
        ledger: &mut TransactionLedger,
    ) -> Result<(), DispatchError> {
        self(call, ledger)
    }
}

/// Read-only view of the value held on behalf of the gate
pub trait BalanceSource {
    fn held_balance(&self) -> u64;
}
