//! Audit events
//!
//! The engine reports every state change to an `AuditSink`. Sinks provided
//! here log events, keep them in memory, or broadcast them to subscribers.

use crate::crypto::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

/// Maximum number of records buffered per broadcast subscriber
const BROADCAST_CAPACITY: usize = 256;

/// State changes reported by the engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum MultisigEvent {
    /// A transaction was submitted
    Submitted {
        index: u64,
        submitter: Address,
        call_count: usize,
        /// Hex-encoded call list
        data: String,
    },
    /// An owner confirmed (also emitted for repeated confirmations)
    Confirmed {
        index: u64,
        owner: Address,
        confirmations: usize,
    },
    /// An owner withdrew a confirmation
    Revoked {
        index: u64,
        owner: Address,
        confirmations: usize,
    },
    /// The batch ran and was committed
    Executed {
        index: u64,
        executor: Address,
        gas_used: u64,
    },
    /// The batch reverted and was rolled back
    ExecutionFailed {
        index: u64,
        executor: Address,
        call_index: usize,
        reason: String,
    },
}

/// An event with its position in the engine's audit log
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Starts at 1 and increases by one per event
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: MultisigEvent,
}

/// Consumer of audit records
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Writes every record to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AuditSink for LogSink {
    fn record(&self, record: &AuditRecord) {
        match &record.event {
            MultisigEvent::Submitted {
                index,
                submitter,
                call_count,
                ..
            } => log::info!(
                "#{} tx {} submitted by {} ({} calls)",
                record.sequence,
                index,
                submitter,
                call_count
            ),
            MultisigEvent::Confirmed {
                index,
                owner,
                confirmations,
            } => log::info!(
                "#{} tx {} confirmed by {} ({} confirmations)",
                record.sequence,
                index,
                owner,
                confirmations
            ),
            MultisigEvent::Revoked {
                index,
                owner,
                confirmations,
            } => log::info!(
                "#{} tx {} revoked by {} ({} confirmations)",
                record.sequence,
                index,
                owner,
                confirmations
            ),
            MultisigEvent::Executed {
                index,
                executor,
                gas_used,
            } => log::info!(
                "#{} tx {} executed by {} (gas used {})",
                record.sequence,
                index,
                executor,
                gas_used
            ),
            MultisigEvent::ExecutionFailed {
                index,
                executor,
                call_index,
                reason,
            } => log::warn!(
                "#{} tx {} failed for {} at call {}: {}",
                record.sequence,
                index,
                executor,
                call_index,
                reason
            ),
        }
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of all events so far, without metadata
    pub fn events(&self) -> Vec<MultisigEvent> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn record(&self, record: &AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

/// Broadcasts records to any number of subscribers
#[derive(Debug)]
pub struct BroadcastSink {
    sender: broadcast::Sender<AuditRecord>,
}

impl BroadcastSink {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for BroadcastSink {
    fn record(&self, record: &AuditRecord) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(record.clone());
    }
}
