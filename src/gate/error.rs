//! Gate error taxonomy

use crate::gate::executor::DispatchError;
use crate::gate::{Principal, TxId};
use thiserror::Error;

/// Errors surfaced by gate operations
///
/// Every variant except `ExecutionFailed` is a plain rejection: the
/// operation changed nothing. `ExecutionFailed` means the executor
/// reported failure and the execution was rolled back.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Unauthorized: {0} is not an owner")]
    Unauthorized(Principal),
    #[error("Transaction not found: {0}")]
    NotFound(TxId),
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(TxId),
    #[error("Transaction {id} already approved by {approver}")]
    DuplicateApproval { id: TxId, approver: Principal },
    #[error("Quorum not met for transaction {id}: have {have}, need {need}")]
    QuorumNotMet { id: TxId, have: usize, need: usize },
    #[error("Execution of transaction {id} failed: {source}")]
    ExecutionFailed {
        id: TxId,
        #[source]
        source: DispatchError,
    },
}
