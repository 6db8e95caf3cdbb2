//! HTTP price source: polling over GET, streaming over SSE

use super::payload::{decode_poll, decode_push};
use super::types::{FeedKind, PriceSnapshot, PriceStream, StreamEvent};
use super::PriceSource;
use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::sse::{SseClient, SseConfig, SseMessage};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;

/// Longest upstream error body kept in a `FeedError::Status`
const MAX_ERROR_BODY: usize = 200;

/// Price source backed by a scraper endpoint
pub struct HttpFeed {
    id: String,
    kind: FeedKind,
    poll_url: String,
    stream_url: Option<String>,
    timeout: Duration,
    client: Client,
}

impl HttpFeed {
    /// Create a polling-only feed
    pub fn new(id: impl Into<String>, kind: FeedKind, poll_url: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(10);
        Self {
            id: id.into(),
            kind,
            poll_url: poll_url.into(),
            stream_url: None,
            timeout,
            client: build_client(timeout),
        }
    }

    /// Create a feed from its configuration section
    pub fn from_config(id: impl Into<String>, config: &FeedConfig, timeout: Duration) -> Self {
        let feed = Self::new(id, config.kind.clone(), &config.url).with_timeout(timeout);
        match &config.stream_url {
            Some(url) => feed.with_stream(url),
            None => feed,
        }
    }

    /// Add a server-sent-events endpoint
    pub fn with_stream(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    /// Set the request timeout (also used as the stream connect timeout)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    pub fn kind(&self) -> &FeedKind {
        &self.kind
    }

    pub fn poll_url(&self) -> &str {
        &self.poll_url
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.stream_url.as_deref()
    }

    /// Translate raw SSE messages into stream events
    async fn run_message_loop(
        kind: FeedKind,
        id: String,
        mut sse_rx: mpsc::Receiver<SseMessage>,
        tx: mpsc::Sender<StreamEvent>,
    ) {
        while let Some(msg) = sse_rx.recv().await {
            let event = match msg {
                SseMessage::Connected => {
                    tracing::info!(feed = %id, "Price stream connected");
                    continue;
                }
                SseMessage::Event { data, .. } => match decode_push(&kind, &id, &data) {
                    Ok(Some(snapshot)) => StreamEvent::Snapshot(snapshot),
                    Ok(None) => StreamEvent::Heartbeat,
                    Err(e) => StreamEvent::Malformed(e),
                },
                SseMessage::Disconnected(e) => {
                    let _ = tx
                        .send(StreamEvent::Closed(Some(FeedError::Network(e.to_string()))))
                        .await;
                    return;
                }
            };

            if tx.send(event).await.is_err() {
                tracing::debug!(feed = %id, "Stream receiver dropped, stopping");
                return;
            }
        }

        let _ = tx.send(StreamEvent::Closed(None)).await;
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[async_trait]
impl PriceSource for HttpFeed {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_once(&self) -> Result<PriceSnapshot, FeedError> {
        tracing::debug!(feed = %self.id, url = %self.poll_url, "Fetching price");

        let response = self.client.get(&self.poll_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        decode_poll(&self.kind, &self.id, &body)
    }

    async fn subscribe(&self) -> Result<Option<PriceStream>, FeedError> {
        let Some(url) = &self.stream_url else {
            return Ok(None);
        };

        tracing::info!(feed = %self.id, url = %url, "Subscribing to price stream");

        let client = SseClient::new(SseConfig::new(url).connect_timeout(self.timeout));
        let (sse_rx, sse_task) = client.connect();

        let (tx, rx) = mpsc::channel(64);
        let loop_task = tokio::spawn(Self::run_message_loop(
            self.kind.clone(),
            self.id.clone(),
            sse_rx,
            tx,
        ));

        Ok(Some(PriceStream::new(rx).with_task(sse_task).with_task(loop_task)))
    }
}
