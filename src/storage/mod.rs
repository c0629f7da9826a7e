//! Storage module for gate persistence

pub mod persistence;

pub use persistence::{GateState, Storage, StorageConfig, StorageError};
