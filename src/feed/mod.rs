//! Price source adapters
//!
//! Each adapter wraps one upstream endpoint (LME spot, LME 3-month, an MCX
//! contract month, an exchange rate) and normalizes its payload into a
//! `PriceSnapshot`. Adapters hold no price state; the scheduler does.

mod http;
mod payload;
mod types;

pub use http::HttpFeed;
pub use payload::{
    decode_poll, decode_push, parse_currency_value, parse_rate_of_change, parse_timestamp,
};
pub use types::{
    ContractMonth, FeedKind, PriceSnapshot, PriceStream, RateField, StreamEvent,
};

use crate::error::FeedError;
use async_trait::async_trait;

/// Trait for price source implementations
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Feed identifier, copied into every snapshot
    fn id(&self) -> &str;

    /// Fetch and decode the current value once
    ///
    /// Fails with `Network`/`Status`/`Upstream` when the endpoint is
    /// unreachable or refuses, and with `Parse` when the payload is malformed.
    async fn fetch_once(&self) -> Result<PriceSnapshot, FeedError>;

    /// Open the push stream, or `None` if this feed has no streaming endpoint
    async fn subscribe(&self) -> Result<Option<PriceStream>, FeedError>;
}
