//! Transaction ledger
//!
//! Owns every submitted record and drives the per-record lifecycle:
//! submit, approve until quorum, execute once.
//!
//! Execution flips the record's `executed` flag *before* handing control to
//! the external executor, so a re-entrant `execute` on the same id is
//! rejected while the first call is still in flight. If the executor
//! fails, everything the execution did (the flag, plus any re-entrant
//! submissions and approvals) is compensated and no events for it are
//! published. A nested execution whose dispatch succeeded is final: it and
//! the work logged before it survive a later failure of the enclosing call.

use crate::gate::events::{EventSink, GateEvent, LogSink};
use crate::gate::executor::ActionExecutor;
use crate::gate::record::{ActionRecord, RecordStatus, TxId};
use crate::gate::registry::OwnerRegistry;
use crate::gate::{GateError, Principal};
use chrono::Utc;
use std::fmt;

/// Compensation entry for a mutation made during an in-flight execution
#[derive(Debug)]
enum Undo {
    Submit,
    Approve { id: TxId, approver: Principal },
    Execute { id: TxId },
}

/// Ordered collection of action records for one owner registry
pub struct TransactionLedger {
    registry: OwnerRegistry,
    /// Records indexed by id
    records: Vec<ActionRecord>,
    sink: Box<dyn EventSink>,
    /// Events held back until the outermost execution commits
    staged: Vec<GateEvent>,
    /// Compensation log for in-flight executions
    undo: Vec<Undo>,
    /// Nesting depth of in-flight executions
    depth: usize,
    /// Staged events belonging to committed nested executions
    finalized: usize,
}

impl TransactionLedger {
    /// Create an empty ledger that logs its events
    pub fn new(registry: OwnerRegistry) -> Self {
        Self::with_sink(registry, LogSink)
    }

    /// Create an empty ledger publishing to `sink`
    pub fn with_sink(registry: OwnerRegistry, sink: impl EventSink + 'static) -> Self {
        Self {
            registry,
            records: Vec::new(),
            sink: Box::new(sink),
            staged: Vec::new(),
            undo: Vec::new(),
            depth: 0,
            finalized: 0,
        }
    }

    /// Rebuild a ledger from persisted records
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if ids are not dense from 0, a cached
    /// approval count disagrees with its approval set, the executed flag
    /// disagrees with the execution time, or an approver is not an owner.
    pub fn restore(
        registry: OwnerRegistry,
        records: Vec<ActionRecord>,
        sink: impl EventSink + 'static,
    ) -> Result<Self, GateError> {
        for (position, record) in records.iter().enumerate() {
            if record.id() != position as TxId {
                return Err(GateError::InvalidConfiguration(format!(
                    "record at position {} has id {}",
                    position,
                    record.id()
                )));
            }
            if !record.is_consistent() {
                return Err(GateError::InvalidConfiguration(format!(
                    "record {} approval count does not match its approvals",
                    record.id()
                )));
            }
            if !record.execution_consistent() {
                return Err(GateError::InvalidConfiguration(format!(
                    "record {} executed flag does not match its execution time",
                    record.id()
                )));
            }
            if let Some(stranger) = record.approvals().find(|p| !registry.is_member(p)) {
                return Err(GateError::InvalidConfiguration(format!(
                    "record {} approved by non-owner {}",
                    record.id(),
                    stranger
                )));
            }
        }

        let mut ledger = Self::with_sink(registry, sink);
        ledger.records = records;
        Ok(ledger)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Propose a new transaction
    ///
    /// Returns the new record's id. Ids are assigned densely from 0.
    pub fn submit(
        &mut self,
        submitter: &Principal,
        target: Principal,
        amount: u64,
        payload: Vec<u8>,
    ) -> Result<TxId, GateError> {
        self.ensure_member(submitter)?;

        let id = self.records.len() as TxId;
        self.records.push(ActionRecord::new(
            id,
            submitter.clone(),
            target.clone(),
            amount,
            payload,
        ));
        self.note(Undo::Submit);

        log::info!(
            "Transaction {} submitted by {}: {} to {}",
            id,
            submitter,
            amount,
            target
        );

        self.emit(GateEvent::Submitted {
            id,
            submitter: submitter.clone(),
            target,
            amount,
            timestamp: Utc::now(),
        });

        Ok(id)
    }

    /// Record an owner's approval of a transaction
    ///
    /// Approving twice is an error, not a no-op.
    pub fn approve(&mut self, approver: &Principal, id: TxId) -> Result<(), GateError> {
        self.ensure_member(approver)?;
        let index = self.index(id)?;

        let record = &mut self.records[index];
        if record.is_executed() {
            return Err(GateError::AlreadyExecuted(id));
        }
        if !record.record_approval(approver.clone()) {
            return Err(GateError::DuplicateApproval {
                id,
                approver: approver.clone(),
            });
        }
        let count = record.approval_count();
        self.note(Undo::Approve {
            id,
            approver: approver.clone(),
        });

        log::info!(
            "Transaction {} approved by {} ({}/{})",
            id,
            approver,
            count,
            self.registry.threshold()
        );

        self.emit(GateEvent::Approved {
            id,
            approver: approver.clone(),
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Execute a transaction that has reached quorum
    ///
    /// Any owner may execute. The record is marked executed before
    /// `actions` is invoked; if `actions` fails the execution is rolled
    /// back and `ExecutionFailed` is returned, leaving the record
    /// retryable.
    pub fn execute(
        &mut self,
        executor: &Principal,
        id: TxId,
        actions: &mut dyn ActionExecutor,
    ) -> Result<(), GateError> {
        self.ensure_member(executor)?;
        let index = self.index(id)?;

        let threshold = self.registry.threshold();
        let record = &mut self.records[index];
        if record.is_executed() {
            return Err(GateError::AlreadyExecuted(id));
        }
        if !record.meets_quorum(threshold) {
            return Err(GateError::QuorumNotMet {
                id,
                have: record.approval_count(),
                need: threshold,
            });
        }

        let staged_mark = self.staged.len();

        // Effects before the external call
        record.mark_executed();
        let call = record.action_call();
        self.undo.push(Undo::Execute { id });
        self.depth += 1;

        let result = actions.dispatch(&call, self);

        self.depth -= 1;
        match result {
            Ok(()) => {
                if self.depth == 0 {
                    self.undo.clear();
                } else {
                    // Value has moved; only enclosing executions stay revertible
                    self.undo.retain(
                        |entry| matches!(entry, Undo::Execute { id: open } if *open != id),
                    );
                }
                log::info!(
                    "Transaction {} executed by {}: {} to {}",
                    id,
                    executor,
                    call.amount,
                    call.target
                );
                self.emit(GateEvent::Executed {
                    id,
                    executor: executor.clone(),
                    timestamp: Utc::now(),
                });
                if self.depth > 0 {
                    self.finalized = self.staged.len();
                }
                Ok(())
            }
            Err(source) => {
                self.rollback(id, staged_mark);
                log::warn!("Transaction {} execution rolled back: {}", id, source);
                Err(GateError::ExecutionFailed { id, source })
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a record by id
    pub fn record(&self, id: TxId) -> Result<&ActionRecord, GateError> {
        let index = self.index(id)?;
        Ok(&self.records[index])
    }

    /// Check whether `principal` approved transaction `id`
    pub fn has_approved(&self, principal: &Principal, id: TxId) -> Result<bool, GateError> {
        Ok(self.record(id)?.has_approved(principal))
    }

    /// Lifecycle status of transaction `id`
    pub fn status(&self, id: TxId) -> Result<RecordStatus, GateError> {
        Ok(self.record(id)?.status(self.registry.threshold()))
    }

    /// All records in id order
    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    /// Records not yet executed
    pub fn pending(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter().filter(|r| !r.is_executed())
    }

    /// Number of submitted transactions (also the next id)
    pub fn transaction_count(&self) -> usize {
        self.records.len()
    }

    pub fn registry(&self) -> &OwnerRegistry {
        &self.registry
    }

    pub fn members(&self) -> &[Principal] {
        self.registry.members()
    }

    pub fn threshold(&self) -> usize {
        self.registry.threshold()
    }

    /// Check if an execution is currently in flight
    pub fn is_executing(&self) -> bool {
        self.depth > 0
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_member(&self, principal: &Principal) -> Result<(), GateError> {
        if self.registry.is_member(principal) {
            Ok(())
        } else {
            log::debug!("Rejected call from non-owner {}", principal);
            Err(GateError::Unauthorized(principal.clone()))
        }
    }

    fn index(&self, id: TxId) -> Result<usize, GateError> {
        usize::try_from(id)
            .ok()
            .filter(|index| *index < self.records.len())
            .ok_or(GateError::NotFound(id))
    }

    /// Log a compensation entry if an execution is in flight
    fn note(&mut self, undo: Undo) {
        if self.depth > 0 {
            self.undo.push(undo);
        }
    }

    /// Publish now, or stage until the outermost execution commits
    fn emit(&mut self, event: GateEvent) {
        self.staged.push(event);
        if self.depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        for event in self.staged.drain(..) {
            self.sink.publish(&event);
        }
        self.finalized = 0;
    }

    /// Unwind the undo log down to and including the entry for `id`
    fn rollback(&mut self, id: TxId, staged_mark: usize) {
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Submit => {
                    self.records.pop();
                }
                Undo::Approve { id, approver } => {
                    if let Some(record) = self.records.get_mut(id as usize) {
                        record.undo_approval(&approver);
                    }
                }
                Undo::Execute { id: undone } => {
                    if let Some(record) = self.records.get_mut(undone as usize) {
                        record.undo_executed();
                    }
                    if undone == id {
                        break;
                    }
                }
            }
        }
        self.staged.truncate(staged_mark.max(self.finalized));
        if self.depth == 0 {
            self.flush();
        }
    }
}

impl fmt::Debug for TransactionLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionLedger")
            .field("registry", &self.registry)
            .field("records", &self.records)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
