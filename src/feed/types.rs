//! Price feed types

use crate::error::FeedError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A single decoded price from one feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Feed identifier (e.g., "lme_3m")
    pub source_id: String,
    /// Price or rate
    pub value: Decimal,
    /// Absolute change reported by the upstream, if any
    pub change: Option<Decimal>,
    /// Percentage change reported by the upstream, if any
    pub change_percent: Option<Decimal>,
    /// Local time the snapshot arrived
    pub timestamp: DateTime<Utc>,
    /// Upstream's own timestamp, when it sent a decodable one
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl PriceSnapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(source_id: impl Into<String>, value: Decimal) -> Self {
        Self {
            source_id: source_id.into(),
            value,
            change: None,
            change_percent: None,
            timestamp: Utc::now(),
            source_timestamp: None,
        }
    }

    pub fn with_change(mut self, change: Option<Decimal>, change_percent: Option<Decimal>) -> Self {
        self.change = change;
        self.change_percent = change_percent;
        self
    }

    pub fn with_source_timestamp(mut self, ts: Option<DateTime<Utc>>) -> Self {
        self.source_timestamp = ts;
        self
    }

    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = ts;
        self
    }
}

/// Which contract month to pick out of a multi-month payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractMonth {
    /// Position in the payload's own ordering (0 = near month)
    Position(usize),
    /// Exact month label as sent by the upstream
    Label(String),
}

/// Field holding the rate in an exchange-rate row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateField {
    /// `rate` (RBI reference rate; `rbi_reference_rate` accepted too)
    Rate,
    /// `sbi_tt_sell`
    SbiTtSell,
}

/// Payload shape of a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedKind {
    /// `{spotPrice, change, changePercent, lastUpdated}`
    Spot,
    /// `{Value, "Rate of Change", Timestamp}`
    ThreeMonth,
    /// `{date, time, timestamp, prices: {label: {price, site_rate_change}}}`
    ContractMonth { month: ContractMonth },
    /// `[{date, rate | sbi_tt_sell}]`
    ExchangeRate { field: RateField },
}

impl FeedKind {
    /// Default polling period in seconds for this kind of feed
    pub fn default_poll_secs(&self) -> u64 {
        match self {
            FeedKind::ThreeMonth | FeedKind::ContractMonth { .. } => 10,
            FeedKind::Spot | FeedKind::ExchangeRate { .. } => 30,
        }
    }
}

/// Event delivered by an open push stream
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A decoded price
    Snapshot(PriceSnapshot),
    /// Keep-alive with no data
    Heartbeat,
    /// A message arrived but could not be decoded
    Malformed(FeedError),
    /// The transport failed or ended; no more events follow
    Closed(Option<FeedError>),
}

/// An open push connection
///
/// Owns the tasks reading the connection; dropping the stream aborts them,
/// which closes the underlying connection.
pub struct PriceStream {
    rx: mpsc::Receiver<StreamEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl PriceStream {
    pub fn new(rx: mpsc::Receiver<StreamEvent>) -> Self {
        Self { rx, tasks: Vec::new() }
    }

    /// Tie a background task's lifetime to this stream
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Next event; a dropped sender reads as a clean close
    pub async fn next(&mut self) -> StreamEvent {
        self.rx.recv().await.unwrap_or(StreamEvent::Closed(None))
    }
}

impl Drop for PriceStream {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
