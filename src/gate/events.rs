//! Gate notifications and observability sinks
//!
//! The gate publishes an append-only audit stream. Delivery is
//! fire-and-forget: a sink can never fail or veto an operation.

use crate::gate::{Principal, TxId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Notification published by the gate
///
/// `OwnerAdded`, `OwnerRemoved` and `ThresholdChanged` are reserved for
/// owner-set management; the core never emits them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GateEvent {
    Submitted {
        id: TxId,
        submitter: Principal,
        target: Principal,
        amount: u64,
        timestamp: DateTime<Utc>,
    },
    Approved {
        id: TxId,
        approver: Principal,
        timestamp: DateTime<Utc>,
    },
    Executed {
        id: TxId,
        executor: Principal,
        timestamp: DateTime<Utc>,
    },
    OwnerAdded {
        owner: Principal,
        timestamp: DateTime<Utc>,
    },
    OwnerRemoved {
        owner: Principal,
        timestamp: DateTime<Utc>,
    },
    ThresholdChanged {
        threshold: usize,
        timestamp: DateTime<Utc>,
    },
}

impl GateEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GateEvent::Submitted { .. } => "submitted",
            GateEvent::Approved { .. } => "approved",
            GateEvent::Executed { .. } => "executed",
            GateEvent::OwnerAdded { .. } => "owner_added",
            GateEvent::OwnerRemoved { .. } => "owner_removed",
            GateEvent::ThresholdChanged { .. } => "threshold_changed",
        }
    }

    /// Transaction the event refers to, if any
    pub fn tx_id(&self) -> Option<TxId> {
        match self {
            GateEvent::Submitted { id, .. }
            | GateEvent::Approved { id, .. }
            | GateEvent::Executed { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            GateEvent::Submitted { timestamp, .. }
            | GateEvent::Approved { timestamp, .. }
            | GateEvent::Executed { timestamp, .. }
            | GateEvent::OwnerAdded { timestamp, .. }
            | GateEvent::OwnerRemoved { timestamp, .. }
            | GateEvent::ThresholdChanged { timestamp, .. } => *timestamp,
        }
    }
}

/// Receiver of gate notifications
pub trait EventSink {
    fn publish(&mut self, event: &GateEvent);
}

/// Writes every event to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&mut self, event: &GateEvent) {
        match event {
            GateEvent::Submitted {
                id,
                submitter,
                target,
                amount,
                ..
            } => log::info!(
                "[event] tx {} submitted by {}: {} -> {}",
                id,
                submitter,
                amount,
                target
            ),
            GateEvent::Approved { id, approver, .. } => {
                log::info!("[event] tx {} approved by {}", id, approver)
            }
            GateEvent::Executed { id, executor, .. } => {
                log::info!("[event] tx {} executed by {}", id, executor)
            }
            other => log::info!("[event] {}", other.kind()),
        }
    }
}

/// Keeps events in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Rc<RefCell<Vec<GateEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn events(&self) -> Vec<GateEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything published so far
    pub fn take(&self) -> Vec<GateEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for MemorySink {
    fn publish(&mut self, event: &GateEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Appends events to a JSON-lines file
#[derive(Debug, Clone)]
pub struct JournalSink {
    path: PathBuf,
}

impl JournalSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: &GateEvent) -> io::Result<()> {
        self.append_all(std::slice::from_ref(event))
    }

    /// Append a batch of events, one line each
    pub fn append_all(&self, events: &[GateEvent]) -> io::Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for event in events {
            let line = serde_json::to_string(event)?;
            writeln!(file, "{}", line)?;
        }
        file.sync_all()
    }

    /// Read back every event in a journal file
    ///
    /// A missing file is an empty journal.
    pub fn replay(path: &Path) -> io::Result<Vec<GateEvent>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }
}

impl EventSink for JournalSink {
    fn publish(&mut self, event: &GateEvent) {
        if let Err(e) = self.append(event) {
            log::warn!(
                "Failed to journal {} event to {:?}: {}",
                event.kind(),
                self.path,
                e
            );
        }
    }
}

/// Publishes to several sinks in order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl EventSink for FanoutSink {
    fn publish(&mut self, event: &GateEvent) {
        for sink in &mut self.sinks {
            sink.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> Principal {
        Principal::parse(name).unwrap()
    }

    fn approved(id: TxId) -> GateEvent {
        GateEvent::Approved {
            id,
            approver: p("alice"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = approved(3);
        assert_eq!(event.kind(), "approved");
        assert_eq!(event.tx_id(), Some(3));

        let reserved = GateEvent::ThresholdChanged {
            threshold: 2,
            timestamp: Utc::now(),
        };
        assert_eq!(reserved.kind(), "threshold_changed");
        assert_eq!(reserved.tx_id(), None);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(approved(1)).unwrap();
        assert_eq!(json["event"], "approved");
        assert_eq!(json["approver"], "alice");
    }

    #[test]
    fn test_memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();

        handle.publish(&approved(0));
        handle.publish(&approved(1));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[1].tx_id(), Some(1));
    }

    #[test]
    fn test_memory_sink_take_drains() {
        let sink = MemorySink::new();
        sink.clone().publish(&approved(3));

        let taken = sink.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].tx_id(), Some(3));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_journal_append_and_replay() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("audit").join("events.jsonl");
        let mut journal = JournalSink::new(&path);

        journal.publish(&approved(0));
        journal.publish(&approved(1));

        let events = JournalSink::replay(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), "approved");
        assert_eq!(events[1].tx_id(), Some(1));
        assert!(JournalSink::replay(&temp_dir.path().join("missing.jsonl"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fanout_delivers_to_all() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let mut fanout = FanoutSink::new()
            .with(first.clone())
            .with(LogSink)
            .with(second.clone());

        fanout.publish(&approved(7));

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }
}
