//! Server-sent events types and configuration

use std::time::Duration;
use thiserror::Error;

/// SSE client configuration
#[derive(Debug, Clone)]
pub struct SseConfig {
    /// Stream endpoint URL
    pub url: String,
    /// Timeout for establishing the connection
    pub connect_timeout: Duration,
    /// Maximum silence (no bytes, not even heartbeats) before the stream is
    /// considered dead
    pub idle_timeout: Duration,
    /// Channel buffer size for parsed events
    pub buffer_size: usize,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout: Duration::from_secs(10),
            // Scrapers emit a heartbeat at least every 120s
            idle_timeout: Duration::from_secs(150),
            buffer_size: 256,
        }
    }
}

impl SseConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, d: Duration) -> Self {
        self.idle_timeout = d;
        self
    }

    /// Set channel buffer size
    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }
}

/// Messages emitted by an SSE connection
#[derive(Debug, Clone, PartialEq)]
pub enum SseMessage {
    /// Connection established and accepted with a 2xx status
    Connected,
    /// One complete event
    Event {
        /// `event:` field, if the server set one
        event: Option<String>,
        /// Concatenated `data:` lines
        data: String,
    },
    /// Connection lost; no further messages follow
    Disconnected(SseError),
}

/// SSE transport errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Unexpected status: {0}")]
    BadStatus(u16),

    #[error("No data received within {0:?}")]
    Idle(Duration),

    #[error("Stream ended")]
    StreamEnded,
}
