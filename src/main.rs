//! HostPulse Server: live host metrics over WebSocket
//!
//! Main entry point that wires all crates together and starts the server.

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use hostpulse_api::{AppState, run_server};
use hostpulse_core::config::AppConfig;
use hostpulse_core::error::AppError;
use hostpulse_stream::StreamEngine;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("HOSTPULSE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting HostPulse v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Resolve collectors ───────────────────────────────
    let collectors = hostpulse_collectors::build_collectors(&config.collection);

    // ── Step 2: Engine (stopped until the first viewer connects) ─
    let engine = StreamEngine::new(config.collection.clone(), &config.stream, collectors);
    let mut faults = engine.controller.faults();

    // ── Step 3: Serve until a signal or an engine fault ──────────
    let state = AppState::new(config, engine);
    let mut fault_watch = faults.clone();
    run_server(state, async move {
        tokio::select! {
            _ = shutdown_signal() => {}
            _ = engine_fault(&mut fault_watch) => {}
        }
    })
    .await?;

    let fault = faults.borrow_and_update().clone();
    if let Some(fault) = fault {
        return Err(AppError::internal(format!("Engine fault: {fault}")));
    }

    tracing::info!("HostPulse server shut down gracefully");
    Ok(())
}

/// Resolves once the engine reports a terminal fault.
async fn engine_fault(faults: &mut watch::Receiver<Option<String>>) {
    let faulted = faults.wait_for(|fault| fault.is_some()).await.is_ok();
    if !faulted {
        std::future::pending::<()>().await;
    }
    tracing::error!("Engine task faulted, shutting down");
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
