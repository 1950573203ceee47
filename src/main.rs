//! Simulated Service Status Dashboard Binary

use clap::Parser;
use status_deck::render::{render_configuration_error, render_snapshot};
use status_deck::{Config, Dashboard, DashboardError, GeminiClient, Result, ThreadRngCoin};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Load services and the outage summary once, print them and exit
    #[arg(long, env = "STATUS_DECK_ONCE")]
    once: bool,

    /// Print snapshots as JSON instead of text
    #[arg(long, env = "STATUS_DECK_JSON")]
    json: bool,

    /// Seconds between printed snapshots
    #[arg(long, env = "STATUS_DECK_RENDER_INTERVAL", default_value_t = 5)]
    render_interval_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    initialize_tracing();

    info!("Starting status dashboard v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        print!("{}", render_configuration_error(&e));
        std::process::exit(1);
    }

    info!(
        "Dashboard configuration - Model: {}, Core services: {}, Additional: {}, Interval: {:?}",
        config.gemini_model,
        config.core_services.join(", "),
        config.additional_services,
        config.auto_refresh_interval
    );

    let client = match GeminiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize Gemini client: {}", e);
            print!("{}", render_configuration_error(&e.to_string()));
            std::process::exit(1);
        }
    };

    let dashboard = Arc::new(Dashboard::new(&config, Arc::new(client), Arc::new(ThreadRngCoin)));

    if cli.once {
        dashboard.load_once().await;
        return print_snapshot(&dashboard, cli.json).await;
    }

    dashboard.start().await?;
    info!("Dashboard {} running, press Ctrl-C to stop", dashboard.id());

    let renderer = {
        let dashboard = Arc::clone(&dashboard);
        let period = Duration::from_secs(cli.render_interval_seconds.max(1));
        let json = cli.json;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(e) = print_snapshot(&dashboard, json).await {
                    error!("Failed to render dashboard: {}", e);
                }
            }
        })
    };

    tokio::signal::ctrl_c().await?;

    renderer.abort();
    dashboard.shutdown().await;
    Ok(())
}

async fn print_snapshot(dashboard: &Dashboard, json: bool) -> Result<()> {
    let snapshot = dashboard.snapshot().await;
    let rendered = if json {
        serde_json::to_string(&snapshot)? + "\n"
    } else {
        render_snapshot(&snapshot)
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush().map_err(DashboardError::from)
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
