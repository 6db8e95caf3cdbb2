//! Per-feed state published by a scheduler

use crate::error::ErrorKind;
use crate::feed::PriceSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// How a feed is currently being kept fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Spawned, deciding between streaming and polling
    Init,
    /// Receiving pushed updates
    Streaming,
    /// Fetching on a fixed period
    Polling,
    /// Holding a user-entered value; no automatic refresh
    Manual,
    /// Cancelled; no further updates
    Terminated,
}

impl ConnectionMode {
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionMode::Streaming | ConnectionMode::Polling)
    }
}

/// Latest known value of one feed plus how it got there
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedState {
    pub snapshot: Option<PriceSnapshot>,
    pub mode: ConnectionMode,
    /// Set by a failed refresh, cleared by the next good value
    pub last_error: Option<ErrorKind>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            snapshot: None,
            mode: ConnectionMode::Init,
            last_error: None,
            updated_at: None,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        self.snapshot.as_ref().map(|s| s.value)
    }

    /// A value is held but the last refresh of it failed
    pub fn is_stale(&self) -> bool {
        self.snapshot.is_some() && self.last_error.is_some()
    }

    /// Replace the snapshot, keeping per-feed timestamps non-decreasing
    pub(crate) fn apply_snapshot(&mut self, mut snapshot: PriceSnapshot) {
        if let Some(previous) = &self.snapshot {
            if snapshot.timestamp < previous.timestamp {
                snapshot.timestamp = previous.timestamp;
            }
        }
        self.updated_at = Some(snapshot.timestamp);
        self.snapshot = Some(snapshot);
        self.last_error = None;
    }

    /// Note a failed refresh; the held snapshot is left untouched
    pub(crate) fn record_failure(&mut self, kind: ErrorKind) {
        self.last_error = Some(kind);
    }
}
