//! SSE client over a streaming HTTP response

use super::types::{SseConfig, SseError, SseMessage};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Reusable SSE client
pub struct SseClient {
    config: SseConfig,
    http: Client,
}

impl SseClient {
    /// Create a new SSE client with the given configuration
    pub fn new(config: SseConfig) -> Self {
        // No overall request timeout: the response body is open-ended
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_default();

        Self { config, http }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(SseConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect and return a receiver for messages
    ///
    /// Spawns a background task that owns the HTTP response. The task ends
    /// after emitting `Disconnected`, when the receiver is dropped, or when
    /// the returned handle is aborted (which closes the connection).
    pub fn connect(&self) -> (mpsc::Receiver<SseMessage>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.buffer_size);
        let config = self.config.clone();
        let http = self.http.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = Self::run_stream(&http, &config, &tx).await {
                tracing::warn!(url = %config.url, error = %e, "SSE stream lost");
                let _ = tx.send(SseMessage::Disconnected(e)).await;
            }
        });

        (rx, handle)
    }

    /// Read the stream until it fails or the receiver goes away
    async fn run_stream(
        http: &Client,
        config: &SseConfig,
        tx: &mpsc::Sender<SseMessage>,
    ) -> Result<(), SseError> {
        tracing::info!(url = %config.url, "Connecting to event stream");

        let response = http
            .get(&config.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| SseError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SseError::BadStatus(response.status().as_u16()));
        }

        if tx.send(SseMessage::Connected).await.is_err() {
            return Ok(());
        }

        let mut body = response.bytes_stream();
        let mut parser = EventParser::default();

        loop {
            let chunk = match tokio::time::timeout(config.idle_timeout, body.next()).await {
                Err(_) => return Err(SseError::Idle(config.idle_timeout)),
                Ok(None) => return Err(SseError::StreamEnded),
                Ok(Some(Err(e))) => return Err(SseError::ConnectionFailed(e.to_string())),
                Ok(Some(Ok(chunk))) => chunk,
            };

            for msg in parser.feed(&chunk) {
                if tx.send(msg).await.is_err() {
                    tracing::debug!("Receiver dropped, closing event stream");
                    return Ok(());
                }
            }
        }
    }
}

/// Incremental `text/event-stream` parser
#[derive(Debug, Default)]
struct EventParser {
    buf: Vec<u8>,
}

impl EventParser {
    /// Append a chunk and return every event it completes
    fn feed(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.buf.extend(chunk.iter().filter(|b| **b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buf.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&block[..end]);
            if let Some(event) = parse_block(&text) {
                events.push(event);
            }
        }
        events
    }
}

/// Parse one blank-line-terminated block; comment-only blocks yield nothing
fn parse_block(block: &str) -> Option<SseMessage> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "data" => data.push(value),
            "event" => event = Some(value.to_string()),
            // id / retry are irrelevant without reconnection
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }

    Some(SseMessage::Event {
        event,
        data: data.join("\n"),
    })
}
