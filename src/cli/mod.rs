//! CLI interface for alu-dash
//!
//! Provides subcommands for:
//! - `serve`: Run the schedulers behind the JSON API
//! - `watch`: Live dashboard in the terminal
//! - `fetch`: Query one feed
//! - `config`: Show configuration

mod fetch;
mod serve;
mod watch;

pub use fetch::FetchArgs;
pub use serve::ServeArgs;
pub use watch::WatchArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "alu-dash")]
#[command(about = "Live aluminium price dashboard for LME and MCX markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the schedulers behind the JSON API
    Serve(ServeArgs),
    /// Live dashboard in the terminal
    Watch(WatchArgs),
    /// Query one feed
    Fetch(FetchArgs),
    /// Show configuration
    Config,
}

/// Resolves on Ctrl-C
pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
