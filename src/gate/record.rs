//! Action records
//!
//! One record per submitted transaction: what should happen, who has
//! approved it, and whether it has executed. Records are never removed.

use crate::gate::Principal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sequence number of a submitted transaction
pub type TxId = u64;

/// Lifecycle position of a record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Waiting for more approvals
    Pending,
    /// Has enough approvals, may be executed by any owner
    Ready,
    /// Executed; terminal
    Executed,
}

/// The action handed to the executor when a record runs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionCall {
    pub id: TxId,
    pub target: Principal,
    pub amount: u64,
    pub payload: Vec<u8>,
}

/// A proposed transaction and its approval state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActionRecord {
    id: TxId,
    /// Owner who submitted the transaction
    submitter: Principal,
    /// Destination of the transfer
    target: Principal,
    /// Value to transfer
    amount: u64,
    /// Opaque call data (hex in JSON)
    #[serde(with = "hex")]
    payload: Vec<u8>,
    /// Owners who approved
    approvals: HashSet<Principal>,
    /// Always `approvals.len()`
    approval_count: usize,
    executed: bool,
    submitted_at: DateTime<Utc>,
    executed_at: Option<DateTime<Utc>>,
}

impl ActionRecord {
    pub(crate) fn new(
        id: TxId,
        submitter: Principal,
        target: Principal,
        amount: u64,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id,
            submitter,
            target,
            amount,
            payload,
            approvals: HashSet::new(),
            approval_count: 0,
            executed: false,
            submitted_at: Utc::now(),
            executed_at: None,
        }
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn submitter(&self) -> &Principal {
        &self.submitter
    }

    pub fn target(&self) -> &Principal {
        &self.target
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn approval_count(&self) -> usize {
        self.approval_count
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    /// Check whether a principal has approved this record
    pub fn has_approved(&self, principal: &Principal) -> bool {
        self.approvals.contains(principal)
    }

    /// Approvers in sorted order
    pub fn approvers(&self) -> Vec<&Principal> {
        let mut approvers: Vec<&Principal> = self.approvals.iter().collect();
        approvers.sort();
        approvers
    }

    /// Check if the record has reached `threshold` approvals
    pub fn meets_quorum(&self, threshold: usize) -> bool {
        self.approval_count >= threshold
    }

    /// Compute the lifecycle status against a threshold
    pub fn status(&self, threshold: usize) -> RecordStatus {
        if self.executed {
            RecordStatus::Executed
        } else if self.meets_quorum(threshold) {
            RecordStatus::Ready
        } else {
            RecordStatus::Pending
        }
    }

    /// Check that the cached count matches the approval set
    pub(crate) fn is_consistent(&self) -> bool {
        self.approval_count == self.approvals.len()
    }

    /// Check that the executed flag and its timestamp agree
    pub(crate) fn execution_consistent(&self) -> bool {
        self.executed == self.executed_at.is_some()
    }

    pub(crate) fn approvals(&self) -> impl Iterator<Item = &Principal> {
        self.approvals.iter()
    }

    pub(crate) fn action_call(&self) -> ActionCall {
        ActionCall {
            id: self.id,
            target: self.target.clone(),
            amount: self.amount,
            payload: self.payload.clone(),
        }
    }

    /// Returns false if the principal had already approved
    pub(crate) fn record_approval(&mut self, principal: Principal) -> bool {
        if !self.approvals.insert(principal) {
            return false;
        }
        self.approval_count += 1;
        true
    }

    /// Compensation for `record_approval` inside a rolled-back execution
    pub(crate) fn undo_approval(&mut self, principal: &Principal) {
        if self.approvals.remove(principal) {
            self.approval_count -= 1;
        }
    }

    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
        self.executed_at = Some(Utc::now());
    }

    /// Compensation for `mark_executed` inside a rolled-back execution
    pub(crate) fn undo_executed(&mut self) {
        self.executed = false;
        self.executed_at = None;
    }
}
