//! Telemetry ingestor binary

use clap::Parser;
use telemetry_ingestor::Cli;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    initialize_tracing(cli.log_level());

    info!("Starting telemetry ingestor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = cli.run().await {
        error!("Ingestion failed: {}", e);
        std::process::exit(1);
    }
}

/// Initialize structured logging
fn initialize_tracing(default_level: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
