//! # Decision Search Server Driver
//!
//! ## Purpose
//! Main entry point for the decision search proxy server. Loads
//! configuration, initializes logging, wires up the rate-limited upstream
//! client and starts the web server.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Construct the shared rate limiter, upstream client and search service
//! 4. Start web API server
//! 5. Handle shutdown signals gracefully

use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use yargitay_search::{
    api::ApiServer,
    config::Config,
    errors::{Result, SearchError},
    search::SearchService,
    AppState,
};

/// Rate-limited search proxy for Turkish Supreme Court (Yargıtay) decisions
#[derive(Parser, Debug)]
#[command(name = "yargitay-search-server", version, about)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Server port override
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let config = Arc::new(config);

    init_logging(&config)?;

    info!("Starting Yargıtay decision search proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);
    info!(
        upstream = %config.upstream.base_url,
        min_delay_ms = config.rate_limit.min_delay_ms,
        max_delay_ms = config.rate_limit.max_delay_ms,
        max_attempts = config.retry.max_attempts,
        "Upstream client settings"
    );

    let search_service = Arc::new(SearchService::from_config(&config)?);
    let app_state = AppState {
        config: config.clone(),
        search_service,
    };

    let server = ApiServer::new(app_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Decision search proxy listening on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    info!("Decision search proxy shut down successfully");
    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|_| SearchError::Config {
            message: format!("Invalid log level: {}", config.logging.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}
