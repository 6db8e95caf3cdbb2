//! Watch command implementation

use crate::aggregate::RateBasis;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::format::{render_dashboard, render_quote};
use clap::Args;
use rust_decimal::Decimal;
use std::time::Duration;

/// Minimum gap between redraws
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Premium added to both markets for the landed quote
    #[arg(long, default_value = "0")]
    pub premium: Decimal,

    /// Freight in INR/kg for the landed quote
    #[arg(long, default_value = "0")]
    pub freight: Decimal,

    /// Exchange rate for LME conversion (rbi, sbi_tt)
    #[arg(long, default_value = "rbi")]
    pub basis: RateBasis,

    /// Print each update instead of redrawing the screen
    #[arg(long)]
    pub plain: bool,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut dashboard = Dashboard::from_config(config);
        if dashboard.is_empty() {
            anyhow::bail!("No feeds configured in [feeds]");
        }
        let mut prices = dashboard.aggregator();

        let shutdown = super::shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            self.draw(&prices.view());

            tokio::select! {
                changed = prices.changed() => {
                    if !changed {
                        break;
                    }
                    tokio::time::sleep(REDRAW_INTERVAL).await;
                }
                _ = &mut shutdown => break,
            }
        }

        dashboard.shutdown();
        Ok(())
    }

    fn draw(&self, view: &crate::aggregate::DashboardView) {
        if !self.plain {
            print!("\x1B[2J\x1B[H");
        }
        println!("{}", render_dashboard(view));
        match view.quote(self.basis, self.premium, self.freight) {
            Ok(quote) => println!("{}", render_quote(&quote)),
            Err(e) => println!("Landed: {}", e),
        }
    }
}
