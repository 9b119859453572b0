use std::path::Path;

use clap::Parser;
use tracing::info;

use spyglass_server::config::SpyglassConfig;
use spyglass_server::factory::{Secrets, build_state};

/// Chat-driven control surface for a search backend.
#[derive(Parser, Debug)]
#[command(name = "spyglass-server", about = "Standalone HTTP server for spyglass")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "spyglass.toml", env = "SPYGLASS_CONFIG")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config_exists = Path::new(&cli.config).exists();
    let config = if config_exists {
        SpyglassConfig::from_toml(&std::fs::read_to_string(&cli.config)?)?
    } else {
        SpyglassConfig::default()
    };

    spyglass_server::telemetry::init(&config.logging)?;
    if !config_exists {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let secrets = Secrets::from_env();
    let state = build_state(&config, &secrets).await?;
    let app = spyglass_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, search = %config.search.base_url, "spyglass-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("spyglass-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
