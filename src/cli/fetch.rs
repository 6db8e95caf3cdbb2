//! Fetch command implementation

use crate::config::Config;
use crate::feed::{HttpFeed, PriceSource, StreamEvent};
use clap::Args;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Feed identifier from the config (e.g. `lme_3m`)
    pub feed: String,

    /// Follow the push stream instead of polling once
    #[arg(short, long)]
    pub stream: bool,
}

impl FetchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let feed_config = config
            .feeds
            .get(&self.feed)
            .ok_or_else(|| anyhow::anyhow!("Unknown feed: {}", self.feed))?;
        let source = HttpFeed::from_config(
            self.feed.clone(),
            feed_config,
            config.scheduler.request_timeout(),
        );

        if !self.stream {
            let snapshot = source.fetch_once().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            return Ok(());
        }

        let Some(mut stream) = source.subscribe().await? else {
            anyhow::bail!("Feed {} has no stream_url", self.feed);
        };

        let shutdown = super::shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = stream.next() => match event {
                    StreamEvent::Snapshot(snapshot) => println!("{}", serde_json::to_string(&snapshot)?),
                    StreamEvent::Heartbeat => tracing::debug!("heartbeat"),
                    StreamEvent::Malformed(e) => tracing::warn!(error = %e, "Malformed message"),
                    StreamEvent::Closed(reason) => {
                        if let Some(e) = reason {
                            return Err(e.into());
                        }
                        break;
                    }
                },
                _ = &mut shutdown => break,
            }
        }

        Ok(())
    }
}
