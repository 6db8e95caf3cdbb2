//! Prometheus metrics

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;

/// Counter metric types, labelled by feed
#[derive(Debug, Clone, Copy)]
pub enum FeedCounter {
    /// Successful poll
    Refresh,
    /// Failed or timed-out poll
    RefreshFailure,
    /// Decoded stream message
    StreamMessage,
    /// Undecodable stream message
    StreamMalformed,
    /// Stream lost, switched to polling
    StreamFallback,
    /// Value entered by hand
    ManualOverride,
}

impl FeedCounter {
    fn name(self) -> &'static str {
        match self {
            FeedCounter::Refresh => "aludash_feed_refresh_total",
            FeedCounter::RefreshFailure => "aludash_feed_refresh_failures_total",
            FeedCounter::StreamMessage => "aludash_stream_messages_total",
            FeedCounter::StreamMalformed => "aludash_stream_malformed_total",
            FeedCounter::StreamFallback => "aludash_stream_fallbacks_total",
            FeedCounter::ManualOverride => "aludash_manual_overrides_total",
        }
    }
}

/// Increment a per-feed counter
pub fn incr_counter(metric: FeedCounter, feed: &str) {
    metrics::counter!(metric.name(), "feed" => feed.to_string()).increment(1);
}

/// Publish the latest value of a feed
pub fn set_price_gauge(feed: &str, value: Decimal) {
    metrics::gauge!("aludash_feed_price", "feed" => feed.to_string())
        .set(value.to_f64().unwrap_or_default());
}

/// Record how long a poll took
pub fn record_fetch_latency(feed: &str, duration: Duration) {
    metrics::histogram!("aludash_fetch_latency_ms", "feed" => feed.to_string())
        .record(duration.as_secs_f64() * 1000.0);
}
