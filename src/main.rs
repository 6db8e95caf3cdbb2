use alu_dash::cli::{Cli, Commands};
use alu_dash::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    let _telemetry = alu_dash::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Serve(args) => {
            tracing::info!("Starting API server");
            args.execute(&config).await?;
        }
        Commands::Watch(args) => {
            args.execute(&config).await?;
        }
        Commands::Fetch(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            for (id, feed) in config.feeds.iter() {
                println!(
                    "  {:<10} {:?} every {}s  {}{}",
                    id,
                    feed.kind,
                    feed.poll_interval().as_secs(),
                    feed.url,
                    feed.stream_url
                        .as_deref()
                        .map(|s| format!(" (stream {})", s))
                        .unwrap_or_default()
                );
            }
            println!("  Request timeout: {}s", config.scheduler.request_timeout_secs);
            println!("  Server: {}", config.server.bind);
            println!(
                "  Logging: {} ({:?})",
                config.telemetry.log_level, config.telemetry.log_format
            );
        }
    }

    Ok(())
}
