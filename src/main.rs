use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rivulet::api::{self, AppState};
use rivulet::config::Config;

#[derive(Parser, Debug)]
#[command(name = "rivulet", about = "Aggregates RSS/Atom feeds into one time-ordered stream")]
struct Args {
    /// Path to the config file
    #[arg(long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Override the listen address (host:port)
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // A malformed config file is a warning, not a startup failure
    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %args.config.display(), error = %e, "Config file unusable, using defaults");
            Config::default()
        }
    };
    config.apply_env_overrides();

    let addr = args
        .listen
        .unwrap_or_else(|| format!("{}:{}", config.host, config.port));
    let default_range = config.default_range.clone();

    let client = reqwest::Client::new();
    let state = AppState::new(config, client);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, default_range = %default_range, "rivulet started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("rivulet shut down");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM so in-flight requests can drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
