//! Gate facade
//!
//! Bundles a ledger with the collaborator that moves value for it, so
//! callers only deal with principals and transaction ids.

use crate::gate::executor::{ActionExecutor, BalanceSource};
use crate::gate::record::{ActionRecord, RecordStatus, TxId};
use crate::gate::{GateError, Principal, TransactionLedger};

/// A ledger plus its executor / balance collaborator
#[derive(Debug)]
pub struct Gate<E> {
    ledger: TransactionLedger,
    treasury: E,
}

impl<E> Gate<E>
where
    E: ActionExecutor + BalanceSource,
{
    pub fn new(ledger: TransactionLedger, treasury: E) -> Self {
        Self { ledger, treasury }
    }

    /// Propose a transfer of `amount` to `target`
    pub fn submit(
        &mut self,
        submitter: &Principal,
        target: Principal,
        amount: u64,
        payload: Vec<u8>,
    ) -> Result<TxId, GateError> {
        self.ledger.submit(submitter, target, amount, payload)
    }

    pub fn approve(&mut self, approver: &Principal, id: TxId) -> Result<(), GateError> {
        self.ledger.approve(approver, id)
    }

    /// Execute through the bundled treasury
    pub fn execute(&mut self, executor: &Principal, id: TxId) -> Result<(), GateError> {
        self.ledger.execute(executor, id, &mut self.treasury)
    }

    pub fn record(&self, id: TxId) -> Result<&ActionRecord, GateError> {
        self.ledger.record(id)
    }

    pub fn has_approved(&self, principal: &Principal, id: TxId) -> Result<bool, GateError> {
        self.ledger.has_approved(principal, id)
    }

    pub fn status(&self, id: TxId) -> Result<RecordStatus, GateError> {
        self.ledger.status(id)
    }

    pub fn members(&self) -> &[Principal] {
        self.ledger.members()
    }

    pub fn transaction_count(&self) -> usize {
        self.ledger.transaction_count()
    }

    /// Value currently held, as reported by the treasury
    pub fn balance(&self) -> u64 {
        self.treasury.held_balance()
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn treasury(&self) -> &E {
        &self.treasury
    }

    /// Mutable treasury access (deposits, recipient policy)
    pub fn treasury_mut(&mut self) -> &mut E {
        &mut self.treasury
    }

    pub fn into_parts(self) -> (TransactionLedger, E) {
        (self.ledger, self.treasury)
    }
}
