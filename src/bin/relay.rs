//! Front-end relay entrypoint.
//!
//! Serves the static UI and proxies `/api/*` to the document API. Refuses to start when
//! `API_ENDPOINT` or `API_KEY` is missing.
use anyhow::{Context, Result};
use docflow::{config::RelayConfig, logging, relay};
use std::net::Ipv4Addr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("Please create a .env file with the required variables.");
            std::process::exit(1);
        }
    };
    let port = config.port;
    tracing::info!(
        environment = %config.environment,
        api_endpoint = %config.api_endpoint,
        static_dir = %config.static_dir,
        "Relay configured"
    );

    let app = relay::create_relay_router(config).context("failed to build relay HTTP client")?;
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!("Relay listening on http://0.0.0.0:{port}");
    axum::serve(listener, app)
        .await
        .context("relay terminated unexpectedly")?;

    Ok(())
}
