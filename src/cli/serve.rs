//! Serve command implementation

use crate::api::{self, AppState};
use crate::config::Config;
use crate::dashboard::Dashboard;
use clap::Args;
use tokio::net::TcpListener;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides `server.bind`)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);

        let mut dashboard = Dashboard::from_config(config);
        if dashboard.is_empty() {
            tracing::warn!("No feeds configured; serving empty views");
        }

        let app = api::router(AppState::new(dashboard.aggregator()));
        let listener = TcpListener::bind(bind).await?;
        tracing::info!(addr = %listener.local_addr()?, "API listening");

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(super::shutdown_signal())
            .await;

        dashboard.shutdown();
        tracing::info!("Shut down");
        served?;
        Ok(())
    }
}
