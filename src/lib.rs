//! Multisig-Gate: an M-of-N multi-party authorization gate in Rust
//!
//! A fixed set of owners must jointly approve a transaction before it
//! executes, so no single owner can move value on their own. This crate
//! provides:
//! - An immutable owner registry with a quorum threshold
//! - A transaction ledger: submit, approve, execute-once
//! - Re-entrancy safe execution with all-or-nothing rollback
//! - An audit event stream (log, memory and JSON-lines sinks)
//! - An in-memory treasury that performs the transfers
//! - secp256k1 owner keys and JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use multisig_gate::gate::{Gate, OwnerRegistry, Principal, TransactionLedger};
//! use multisig_gate::treasury::Vault;
//!
//! // Create a 2-of-3 gate holding 100
//! let registry = OwnerRegistry::from_strings(&["alice", "bob", "carol"], 2).unwrap();
//! let mut gate = Gate::new(TransactionLedger::new(registry), Vault::with_balance(100));
//!
//! let alice = Principal::parse("alice").unwrap();
//! let bob = Principal::parse("bob").unwrap();
//! let carol = Principal::parse("carol").unwrap();
//! let shop = Principal::parse("shop").unwrap();
//!
//! // Propose, collect approvals, execute
//! let id = gate.submit(&alice, shop.clone(), 10, vec![]).unwrap();
//! gate.approve(&alice, id).unwrap();
//! gate.approve(&bob, id).unwrap();
//! gate.execute(&carol, id).unwrap();
//!
//! assert!(gate.record(id).unwrap().is_executed());
//! assert_eq!(gate.balance(), 90);
//! assert_eq!(gate.treasury().paid_to(&shop), 10);
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod gate;
pub mod storage;
pub mod treasury;

// Re-export commonly used types
pub use config::GateConfig;
pub use crypto::KeyPair;
pub use gate::{
    ActionExecutor, ActionRecord, BalanceSource, Gate, GateError, GateEvent, OwnerRegistry,
    Principal, TransactionLedger, TxId,
};
pub use storage::{GateState, Storage, StorageConfig};
pub use treasury::Vault;
