use anyhow::Result;
use laqueus::config::{ConfigLoader, LogConfig, LogFormat};
use laqueus::server::{self, AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // An explicit path argument wins over the default search locations
    let loader = match std::env::args().nth(1) {
        Some(path) => ConfigLoader::from_path(path)?,
        None => ConfigLoader::new()?,
    };
    let config = loader.into_config();

    init_tracing(&config.log);

    tracing::info!(
        addr = %config.bind_address(),
        upstream = %config.upstream.base_url,
        remote_registry = config.registry.url.is_some(),
        "starting laqueus"
    );

    let router = laqueus::build_router(&config).await?;
    let shutdown = CancellationToken::new();

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, abandoning in-flight dispatches");
        trigger.cancel();
    });

    server::serve(&config.bind_address(), AppState { router, shutdown }).await?;
    Ok(())
}

/// Initialize tracing based on configuration.
fn init_tracing(config: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
