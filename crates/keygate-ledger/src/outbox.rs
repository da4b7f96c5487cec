//! Outbox
//!
//! The append-only notification channel towards the off-ledger signer network.
//! The state machine only ever writes to it; watchers read from subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use keygate_core::Event;

/// Write side of the log; publishing cannot fail
pub trait Outbox {
    /// Append a record and return its sequence number
    fn publish(&mut self, event: Event) -> u64;
}

/// A log entry as delivered to watchers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Position in the total order of accepted calls
    pub sequence: u64,

    pub recorded_at: DateTime<Utc>,

    pub event: Event,
}

/// Journal plus fan-out to channel subscribers
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<LogRecord>,
    subscribers: Vec<mpsc::UnboundedSender<LogRecord>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a persisted journal; numbering continues after its last record
    pub fn from_records(records: Vec<LogRecord>) -> Self {
        Self {
            records,
            subscribers: Vec::new(),
        }
    }

    /// Receive every record published from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<LogRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.records.iter().map(|r| &r.event)
    }

    pub fn last(&self) -> Option<&Event> {
        self.records.last().map(|r| &r.event)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Outbox for EventLog {
    fn publish(&mut self, event: Event) -> u64 {
        let sequence = self
            .records
            .last()
            .map_or(0, |last| last.sequence + 1);
        let record = LogRecord {
            sequence,
            recorded_at: Utc::now(),
            event,
        };

        self.subscribers.retain(|tx| tx.send(record.clone()).is_ok());
        debug!(
            "Published {} #{} to {} subscriber(s)",
            record.event.name(),
            record.sequence,
            self.subscribers.len()
        );

        self.records.push(record);
        sequence
    }
}
