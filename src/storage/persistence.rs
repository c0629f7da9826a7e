//! Gate persistence layer
//!
//! Saves and loads the full gate state (owners, records, treasury) as
//! pretty-printed JSON, with atomic writes and rotating backups.

use crate::gate::{ActionRecord, EventSink, Gate, GateError, OwnerRegistry, TransactionLedger};
use crate::treasury::Vault;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid gate state: {0}")]
    InvalidState(#[from] GateError),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".gate_data"),
            state_file: "gate.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Serializable snapshot of a gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateState {
    #[serde(default)]
    pub label: Option<String>,
    pub registry: OwnerRegistry,
    pub records: Vec<ActionRecord>,
    pub vault: Vault,
}

impl GateState {
    /// Fresh state with no transactions and an empty vault
    pub fn new(registry: OwnerRegistry, label: Option<String>) -> Self {
        Self {
            label,
            registry,
            records: Vec::new(),
            vault: Vault::new(),
        }
    }

    /// Snapshot a running gate
    pub fn capture(gate: &Gate<Vault>, label: Option<String>) -> Self {
        Self {
            label,
            registry: gate.ledger().registry().clone(),
            records: gate.ledger().records().to_vec(),
            vault: gate.treasury().clone(),
        }
    }

    /// Rebuild a running gate publishing to `sink`
    pub fn into_gate(self, sink: impl EventSink + 'static) -> Result<Gate<Vault>, GateError> {
        let ledger = TransactionLedger::restore(self.registry, self.records, sink)?;
        Ok(Gate::new(ledger, self.vault))
    }
}

/// Gate state storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.config.data_dir
    }

    /// Get the state file path
    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    /// Get a backup file path
    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save the gate state to disk
    pub fn save(&self, state: &GateState) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.state_file));
        if let Err(e) = write_state(&temp_path, state) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Load the gate state from disk
    pub fn load(&self) -> Result<GateState, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Gate state file not found".to_string(),
            ));
        }

        read_state(&path)
    }

    /// Check if a saved state exists
    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Delete the saved state
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<GateState, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_state(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }
}

/// Read a state file and check it describes a valid gate
fn read_state(path: &Path) -> Result<GateState, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let state: GateState = serde_json::from_reader(reader)?;

    // Surface tampered records now rather than on first use
    TransactionLedger::restore(
        state.registry.clone(),
        state.records.clone(),
        crate::gate::LogSink,
    )?;

    Ok(state)
}

/// Write a state file, reporting flush and sync failures
fn write_state(path: &Path, state: &GateState) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, state)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(())
}
