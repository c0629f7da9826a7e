//! CLI commands for the gate
//!
//! Implements all command handlers for the CLI interface.

use crate::config::GateConfig;
use crate::crypto::KeyPair;
use crate::gate::{
    FanoutSink, Gate, GateEvent, JournalSink, LogSink, MemorySink, Principal, RecordStatus,
    TxId,
};
use crate::storage::{GateState, Storage, StorageConfig};
use crate::treasury::Vault;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Audit journal file inside the data directory
pub const EVENTS_FILE: &str = "events.jsonl";

/// Application state
///
/// Events reach the log as they happen but are only written to the journal
/// once the state that produced them has been saved.
pub struct AppState {
    pub gate: Gate<Vault>,
    pub storage: Storage,
    pub label: Option<String>,
    pub data_dir: PathBuf,
    journal: JournalSink,
    unjournaled: MemorySink,
}

impl AppState {
    /// Load a previously initialized gate
    pub fn load(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;

        if !storage.exists() {
            return Err(format!(
                "no gate found in {:?}; create one with: multisig-gate init",
                data_dir
            )
            .into());
        }

        let state = storage.load()?;
        let label = state.label.clone();
        let unjournaled = MemorySink::new();
        let sink = FanoutSink::new().with(LogSink).with(unjournaled.clone());
        let gate = state.into_gate(sink)?;

        Ok(Self {
            gate,
            storage,
            label,
            journal: JournalSink::new(data_dir.join(EVENTS_FILE)),
            unjournaled,
            data_dir,
        })
    }

    /// Save the current state, then journal the events it contains
    pub fn save(&self) -> CliResult<()> {
        self.storage
            .save(&GateState::capture(&self.gate, self.label.clone()))?;
        self.journal.append_all(&self.unjournaled.take())?;
        Ok(())
    }
}

fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Resolve the acting principal from `--as` or `--key`
///
/// A private key proves the caller holds an owner key; a bare principal is
/// trusted as given.
pub fn resolve_caller(principal: Option<&str>, key: Option<&str>) -> CliResult<Principal> {
    match (principal, key) {
        (_, Some(key)) => Ok(KeyPair::from_private_key_hex(key)?.principal()),
        (Some(principal), None) => Ok(Principal::parse(principal)?),
        (None, None) => Err("an acting principal is required: pass --as or --key".into()),
    }
}

/// Decode a hex payload, with or without a 0x prefix
pub fn parse_payload(payload: Option<&str>) -> CliResult<Vec<u8>> {
    let Some(payload) = payload else {
        return Ok(Vec::new());
    };
    let digits = payload.strip_prefix("0x").unwrap_or(payload);
    Ok(hex::decode(digits)?)
}

/// Initialize a new gate
pub fn cmd_init(data_dir: &Path, config: &GateConfig, force: bool) -> CliResult<()> {
    let storage = Storage::new(storage_config(data_dir))?;

    if storage.exists() && !force {
        println!("⚠️  Gate already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let registry = config.build_registry()?;
    let description = registry.description();
    storage.delete()?;
    let journal = data_dir.join(EVENTS_FILE);
    if journal.exists() {
        std::fs::remove_file(journal)?;
    }
    storage.save(&GateState::new(registry, config.label.clone()))?;

    println!("✅ Gate initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🔐 Policy: {}", description);
    for owner in &config.owners {
        println!("   └─ {}", owner);
    }

    Ok(())
}

/// Generate a new owner key
pub fn cmd_keygen() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔑 New owner key");
    println!("   Principal:   {}", key_pair.principal());
    println!("   Public key:  {}", key_pair.public_key_hex());
    println!("   Private key: {}", key_pair.private_key_hex());
    println!("\n   Keep the private key secret; pass it with --key to act as this owner.");

    Ok(())
}

/// Credit the gate's vault
pub fn cmd_deposit(state: &mut AppState, from: &Principal, amount: u64) -> CliResult<()> {
    let balance = state.gate.treasury_mut().deposit(from, amount)?;
    state.save()?;

    println!("📥 Deposited {} from {}", amount, from);
    println!("   Balance: {}", balance);

    Ok(())
}

/// Propose a transaction
pub fn cmd_submit(
    state: &mut AppState,
    caller: &Principal,
    to: &str,
    amount: u64,
    payload: Option<&str>,
) -> CliResult<()> {
    let target = Principal::parse(to)?;
    let payload = parse_payload(payload)?;
    let id = state.gate.submit(caller, target, amount, payload)?;
    state.save()?;

    println!("📝 Transaction {} submitted", id);
    println!("   To: {}", to);
    println!("   Amount: {}", amount);
    println!(
        "   Needs {} approval(s) before execution",
        state.gate.ledger().threshold()
    );

    Ok(())
}

/// Approve a transaction
pub fn cmd_approve(state: &mut AppState, caller: &Principal, id: TxId) -> CliResult<()> {
    state.gate.approve(caller, id)?;
    state.save()?;

    let record = state.gate.record(id)?;
    println!("✍️  Transaction {} approved by {}", id, caller);
    println!(
        "   Approvals: {}/{}",
        record.approval_count(),
        state.gate.ledger().threshold()
    );
    if state.gate.status(id)? == RecordStatus::Ready {
        println!("   ✅ Quorum reached; any owner may now execute it");
    }

    Ok(())
}

/// Execute a transaction that reached quorum
pub fn cmd_execute(state: &mut AppState, caller: &Principal, id: TxId) -> CliResult<()> {
    state.gate.execute(caller, id)?;
    state.save()?;

    let record = state.gate.record(id)?;
    println!("🚀 Transaction {} executed by {}", id, caller);
    println!("   Sent {} to {}", record.amount(), record.target());
    println!("   Remaining balance: {}", state.gate.balance());

    Ok(())
}

/// Show one transaction
pub fn cmd_show(state: &AppState, id: TxId) -> CliResult<()> {
    let record = state.gate.record(id)?;
    let status = state.gate.status(id)?;

    println!("📄 Transaction {}", id);
    println!("   ├─ Status: {:?}", status);
    println!("   ├─ Submitted by: {}", record.submitter());
    println!(
        "   ├─ Submitted at: {}",
        record.submitted_at().format("%Y-%m-%d %H:%M:%S")
    );
    println!("   ├─ To: {}", record.target());
    println!("   ├─ Amount: {}", record.amount());
    if !record.payload().is_empty() {
        println!("   ├─ Payload: 0x{}", hex::encode(record.payload()));
    }
    if let Some(executed_at) = record.executed_at() {
        println!(
            "   ├─ Executed at: {}",
            executed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!(
        "   └─ Approvals: {}/{}",
        record.approval_count(),
        state.gate.ledger().threshold()
    );
    for approver in record.approvers() {
        println!("      └─ {}", approver);
    }

    Ok(())
}

/// List transactions
pub fn cmd_list(state: &AppState, pending_only: bool) -> CliResult<()> {
    let ledger = state.gate.ledger();
    let records: Vec<_> = if pending_only {
        ledger.pending().collect()
    } else {
        ledger.records().iter().collect()
    };

    if records.is_empty() {
        println!("📭 No transactions");
        return Ok(());
    }

    println!("📋 Transactions:");
    for record in records {
        println!(
            "   #{} | {:?} | {}/{} | {} -> {}",
            record.id(),
            record.status(ledger.threshold()),
            record.approval_count(),
            ledger.threshold(),
            record.amount(),
            record.target()
        );
    }

    Ok(())
}

/// List owners and policy
pub fn cmd_owners(state: &AppState) -> CliResult<()> {
    let registry = state.gate.ledger().registry();

    match &state.label {
        Some(label) => println!("🔐 {} ({})", label, registry.description()),
        None => println!("🔐 {}", registry.description()),
    }
    for owner in registry.members() {
        println!("   └─ {}", owner);
    }

    Ok(())
}

/// Show vault balance
pub fn cmd_balance(state: &AppState) -> CliResult<()> {
    let vault = state.gate.treasury();

    println!("💰 Balance: {}", state.gate.balance());
    if !vault.outbox().is_empty() {
        println!("   Dispatched payloads: {}", vault.outbox().len());
    }

    Ok(())
}

/// Print the audit journal
pub fn cmd_events(data_dir: &Path, tx: Option<TxId>) -> CliResult<()> {
    let events = JournalSink::replay(&data_dir.join(EVENTS_FILE))?;
    let events: Vec<&GateEvent> = events
        .iter()
        .filter(|e| tx.is_none() || e.tx_id() == tx)
        .collect();

    if events.is_empty() {
        println!("📭 No events");
        return Ok(());
    }

    println!("📜 Events:");
    for event in events {
        println!(
            "   {} | {:<10} | {}",
            event.timestamp().format("%Y-%m-%d %H:%M:%S"),
            event.kind(),
            serde_json::to_string(event)?
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_caller() {
        let key = KeyPair::generate();

        let by_key = resolve_caller(None, Some(&key.private_key_hex())).unwrap();
        assert_eq!(by_key, key.principal());

        let by_name = resolve_caller(Some("alice"), None).unwrap();
        assert_eq!(by_name.as_str(), "alice");

        assert!(resolve_caller(None, None).is_err());
        assert!(resolve_caller(Some(""), None).is_err());
    }

    #[test]
    fn test_parse_payload() {
        assert!(parse_payload(None).unwrap().is_empty());
        assert_eq!(parse_payload(Some("0xcafe")).unwrap(), vec![0xca, 0xfe]);
        assert_eq!(parse_payload(Some("01")).unwrap(), vec![0x01]);
        assert!(parse_payload(Some("xyz")).is_err());
    }

    #[test]
    fn test_cli_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        let config = GateConfig::new(
            vec!["alice".into(), "bob".into(), "carol".into()],
            2,
            Some("ops".into()),
        );
        cmd_init(&data_dir, &config, false).unwrap();

        let alice = Principal::parse("alice").unwrap();
        let bob = Principal::parse("bob").unwrap();

        let mut state = AppState::load(data_dir.clone()).unwrap();
        cmd_deposit(&mut state, &alice, 100).unwrap();
        cmd_submit(&mut state, &alice, "shop", 25, Some("0x01")).unwrap();
        cmd_approve(&mut state, &alice, 0).unwrap();
        cmd_approve(&mut state, &bob, 0).unwrap();
        cmd_execute(&mut state, &bob, 0).unwrap();

        // Everything survives a reload
        let state = AppState::load(data_dir.clone()).unwrap();
        assert_eq!(state.label.as_deref(), Some("ops"));
        assert_eq!(state.gate.balance(), 75);
        assert!(state.gate.record(0).unwrap().is_executed());

        let journal = JournalSink::replay(&data_dir.join(EVENTS_FILE)).unwrap();
        let kinds: Vec<&str> = journal.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["submitted", "approved", "approved", "executed"]);
    }

    #[test]
    fn test_unsaved_changes_are_not_journaled() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        let config = GateConfig::new(vec!["alice".into(), "bob".into()], 1, None);
        cmd_init(&data_dir, &config, false).unwrap();
        let alice = Principal::parse("alice").unwrap();
        let journal = data_dir.join(EVENTS_FILE);

        // Block the state write so the submit cannot be persisted
        let blocker = data_dir.join("gate.json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        let mut state = AppState::load(data_dir.clone()).unwrap();
        assert!(cmd_submit(&mut state, &alice, "shop", 5, None).is_err());
        assert!(JournalSink::replay(&journal).unwrap().is_empty());

        std::fs::remove_dir(&blocker).unwrap();
        let mut state = AppState::load(data_dir.clone()).unwrap();
        cmd_submit(&mut state, &alice, "shop", 5, None).unwrap();

        let events = JournalSink::replay(&journal).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tx_id(), Some(0));
    }

    #[test]
    fn test_load_requires_init() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::load(temp_dir.path().to_path_buf()).is_err());
    }
}
