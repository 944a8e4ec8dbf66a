use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use instagram_discord_notifier::config::{Config, StoreBackend};
use instagram_discord_notifier::scheduler::Scheduler;
use instagram_discord_notifier::{store, web};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting instagram-discord-notifier");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        backend = ?config.store_backend,
        interval = ?config.poll_interval,
        "Configuration loaded"
    );

    // Ensure the state directory exists before the store opens it
    let state_path = match config.store_backend {
        StoreBackend::File => &config.state_file_path,
        StoreBackend::Sqlite => &config.database_path,
    };
    if let Some(parent) = state_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create state directory: {}", parent.display())
        })?;
    }

    // Open the durable last-seen store
    let store = store::open(&config)
        .await
        .context("Failed to open last-seen store")?;

    info!("Last-seen store ready");

    let cancel = CancellationToken::new();

    // Start the liveness endpoint in the background
    let web_config = config.clone();
    let web_cancel = cancel.clone();
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(&web_config, web_cancel).await {
            error!("Liveness server error: {e:#}");
        }
    });

    // Start the polling scheduler; the first cycle fires immediately
    let scheduler = Arc::new(Scheduler::new(config, store).context("Failed to build scheduler")?);
    let scheduler_handle = tokio::spawn(scheduler.run(cancel.clone()));

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutting down...");

    cancel.cancel();
    let _ = scheduler_handle.await;
    let _ = web_handle.await;

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,instagram_discord_notifier=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
