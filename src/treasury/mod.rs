//! Treasury backing a gate
//!
//! The [`Vault`] is the bundled action executor and balance source: it
//! holds deposited value, pays out executed transactions and keeps the
//! payloads delivered with them.

pub mod vault;

pub use vault::{Dispatch, Vault};
