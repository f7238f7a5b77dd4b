//! preboot stub server entry point.
//!
//! Initialises tracing, loads configuration from environment variables
//! (prefixed with `PREBOOT_STUB_`) and serves canned preboot responses for
//! local development of the CLI.

mod fixture;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use preboot_common::StubServerConfig;

use crate::fixture::Fixture;
use crate::routes::{StubState, router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("preboot-stub starting");

    // Each field maps to PREBOOT_STUB_<FIELD>: LISTEN_ADDR, FIXTURE,
    // SCAN_DELAY_MS, REFUSE_DECIDE.
    let config: StubServerConfig = envy::prefixed("PREBOOT_STUB_")
        .from_env()
        .context("failed to load config from PREBOOT_STUB_* env vars")?;

    let fixture = Fixture::load(config.fixture.as_deref())?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        fixture = ?config.fixture,
        scan_delay_ms = config.scan_delay_ms,
        refuse_decide = config.refuse_decide,
        "configuration loaded",
    );

    let state = Arc::new(StubState::new(
        fixture,
        Duration::from_millis(config.scan_delay_ms),
        config.refuse_decide,
    ));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("failed to bind TCP listener")?;

    tracing::info!("stub ready at http://{}", config.listen_addr);

    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!(decisions = state.decisions(), "preboot-stub shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
