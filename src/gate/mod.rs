//! Multi-party authorization gate
//!
//! A fixed set of owners must jointly approve a transaction before it can
//! execute. M approvals out of N owners reach quorum; any owner may then
//! execute it, exactly once.
//!
//! # Example
//!
//! ```ignore
//! use multisig_gate::gate::{OwnerRegistry, TransactionLedger};
//!
//! // 2-of-3 gate
//! let registry = OwnerRegistry::from_strings(&["alice", "bob", "carol"], 2)?;
//! let mut ledger = TransactionLedger::new(registry);
//!
//! let id = ledger.submit(&alice, shop, 10, vec![])?;
//! ledger.approve(&alice, id)?;
//! ledger.approve(&bob, id)?;
//! ledger.execute(&carol, id, &mut vault)?;
//! ```

pub mod error;
pub mod events;
pub mod executor;
pub mod gate;
pub mod ledger;
pub mod principal;
pub mod record;
pub mod registry;

pub use error::GateError;
pub use events::{EventSink, FanoutSink, GateEvent, JournalSink, LogSink, MemorySink};
pub use executor::{ActionExecutor, BalanceSource, DispatchError};
pub use gate::Gate;
pub use ledger::TransactionLedger;
pub use principal::{IdentityError, Principal};
pub use record::{ActionCall, ActionRecord, RecordStatus, TxId};
pub use registry::OwnerRegistry;
