//! In-memory treasury
//!
//! Holds the value controlled by the gate and performs transfers once a
//! transaction executes. A transfer either applies completely (debit,
//! credit, outbox entry) or not at all.

use crate::gate::{
    ActionCall, ActionExecutor, BalanceSource, DispatchError, Principal, TransactionLedger, TxId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A payload delivered alongside a transfer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dispatch {
    pub tx_id: TxId,
    pub target: Principal,
    pub amount: u64,
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
    pub dispatched_at: DateTime<Utc>,
}

/// Value store backing a gate
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Vault {
    /// Value currently held
    balance: u64,
    /// Total paid out per recipient
    payouts: HashMap<Principal, u64>,
    /// Delivered payloads, oldest first
    outbox: Vec<Dispatch>,
    /// Recipients whose transfers bounce
    refusing: HashSet<Principal>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vault already holding `balance`
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Credit the vault
    ///
    /// Returns the new balance.
    pub fn deposit(&mut self, from: &Principal, amount: u64) -> Result<u64, DispatchError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(DispatchError::Overflow)?;
        log::info!(
            "Deposit of {} from {} (balance {})",
            amount,
            from,
            self.balance
        );
        Ok(self.balance)
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Total value paid out to `recipient`
    pub fn paid_to(&self, recipient: &Principal) -> u64 {
        self.payouts.get(recipient).copied().unwrap_or(0)
    }

    pub fn outbox(&self) -> &[Dispatch] {
        &self.outbox
    }

    /// Make transfers to `recipient` fail
    pub fn refuse(&mut self, recipient: Principal) {
        self.refusing.insert(recipient);
    }

    /// Undo a previous `refuse`
    pub fn accept(&mut self, recipient: &Principal) {
        self.refusing.remove(recipient);
    }

    /// Perform a transfer, validating everything before mutating
    pub fn transfer(&mut self, call: &ActionCall) -> Result<(), DispatchError> {
        if self.refusing.contains(&call.target) {
            return Err(DispatchError::Refused(call.target.clone()));
        }
        if call.amount > self.balance {
            return Err(DispatchError::InsufficientFunds {
                have: self.balance,
                need: call.amount,
            });
        }
        let credited = self
            .paid_to(&call.target)
            .checked_add(call.amount)
            .ok_or(DispatchError::Overflow)?;

        self.balance -= call.amount;
        self.payouts.insert(call.target.clone(), credited);
        if !call.payload.is_empty() {
            self.outbox.push(Dispatch {
                tx_id: call.id,
                target: call.target.clone(),
                amount: call.amount,
                payload: call.payload.clone(),
                dispatched_at: Utc::now(),
            });
        }

        log::debug!(
            "Transferred {} to {} for tx {} (balance {})",
            call.amount,
            call.target,
            call.id,
            self.balance
        );
        Ok(())
    }
}

impl ActionExecutor for Vault {
    fn dispatch(
        &mut self,
        call: &ActionCall,
        _ledger: &mut TransactionLedger,
    ) -> Result<(), DispatchError> {
        self.transfer(call)
    }
}

impl BalanceSource for Vault {
    fn held_balance(&self) -> u64 {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> Principal {
        Principal::parse(name).unwrap()
    }

    fn call(id: TxId, target: &str, amount: u64, payload: Vec<u8>) -> ActionCall {
        ActionCall {
            id,
            target: p(target),
            amount,
            payload,
        }
    }

    #[test]
    fn test_deposit() {
        let mut vault = Vault::new();
        assert_eq!(vault.deposit(&p("alice"), 100).unwrap(), 100);
        assert_eq!(vault.deposit(&p("bob"), 50).unwrap(), 150);
        assert_eq!(vault.held_balance(), 150);
    }

    #[test]
    fn test_deposit_overflow() {
        let mut vault = Vault::with_balance(u64::MAX);
        assert_eq!(vault.deposit(&p("alice"), 1), Err(DispatchError::Overflow));
        assert_eq!(vault.balance(), u64::MAX);
    }

    #[test]
    fn test_transfer() {
        let mut vault = Vault::with_balance(100);

        vault.transfer(&call(0, "shop", 30, vec![])).unwrap();
        vault.transfer(&call(1, "shop", 20, vec![0x01])).unwrap();

        assert_eq!(vault.balance(), 50);
        assert_eq!(vault.paid_to(&p("shop")), 50);
        assert_eq!(vault.outbox().len(), 1);
        assert_eq!(vault.outbox()[0].tx_id, 1);
    }

    #[test]
    fn test_transfer_insufficient_funds_changes_nothing() {
        let mut vault = Vault::with_balance(10);

        let result = vault.transfer(&call(0, "shop", 11, vec![0xff]));
        assert_eq!(
            result,
            Err(DispatchError::InsufficientFunds { have: 10, need: 11 })
        );
        assert_eq!(vault.balance(), 10);
        assert_eq!(vault.paid_to(&p("shop")), 0);
        assert!(vault.outbox().is_empty());
    }

    #[test]
    fn test_refusing_recipient() {
        let mut vault = Vault::with_balance(10);
        vault.refuse(p("wall"));

        assert!(matches!(
            vault.transfer(&call(0, "wall", 1, vec![])),
            Err(DispatchError::Refused(_))
        ));
        assert_eq!(vault.balance(), 10);

        vault.accept(&p("wall"));
        vault.transfer(&call(0, "wall", 1, vec![])).unwrap();
        assert_eq!(vault.balance(), 9);
    }

    #[test]
    fn test_zero_amount_data_call() {
        let mut vault = Vault::new();
        vault.transfer(&call(4, "contract", 0, vec![0xca, 0xfe])).unwrap();

        assert_eq!(vault.balance(), 0);
        assert_eq!(vault.outbox()[0].payload, vec![0xca, 0xfe]);
    }
}
