//! Configuration types for alu-dash

use crate::feed::FeedKind;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Upstream feeds, one optional section per dashboard slot
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedsConfig {
    pub lme_spot: Option<FeedConfig>,
    pub lme_3m: Option<FeedConfig>,
    pub mcx_near: Option<FeedConfig>,
    pub mcx_next: Option<FeedConfig>,
    pub rbi: Option<FeedConfig>,
    pub sbi_tt: Option<FeedConfig>,
}

impl FeedsConfig {
    /// Configured feeds paired with their identifiers
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeedConfig)> {
        [
            ("lme_spot", &self.lme_spot),
            ("lme_3m", &self.lme_3m),
            ("mcx_near", &self.mcx_near),
            ("mcx_next", &self.mcx_next),
            ("rbi", &self.rbi),
            ("sbi_tt", &self.sbi_tt),
        ]
        .into_iter()
        .filter_map(|(id, feed)| feed.as_ref().map(|f| (id, f)))
    }

    /// Look up a feed section by identifier
    pub fn get(&self, id: &str) -> Option<&FeedConfig> {
        self.iter().find(|(name, _)| *name == id).map(|(_, f)| f)
    }
}

/// A single upstream feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Payload shape (`kind = "spot"`, `"three_month"`, ...)
    #[serde(flatten)]
    pub kind: FeedKind,
    /// Polling endpoint
    pub url: String,
    /// Server-sent-events endpoint, if the upstream pushes
    pub stream_url: Option<String>,
    /// Polling period override; defaults by feed kind
    pub poll_secs: Option<u64>,
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_secs
                .unwrap_or_else(|| self.kind.default_poll_secs())
                .max(1),
        )
    }
}

/// Live update scheduler settings shared by all feeds
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Upper bound on a single fetch (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl SchedulerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormatSetting,
    /// Prometheus listener port; no exporter when absent
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormatSetting::default(),
            metrics_port: None,
        }
    }
}

/// Log output format as written in the config file
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    #[default]
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
