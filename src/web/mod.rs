//! Liveness endpoint for external uptime monitoring. Not part of the core
//! detection logic.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;

/// Build the liveness router.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", get(liveness))
        .layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    "Instagram notifier is running."
}

/// Serve the liveness endpoint until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the listen address is invalid or binding fails.
pub async fn serve(config: &Config, cancel: CancellationToken) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid liveness endpoint address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind liveness endpoint")?;

    info!(addr = %addr, "Liveness endpoint listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("Liveness server error")?;

    Ok(())
}
