//! Application builder and server runner.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use hostpulse_core::error::ErrorKind;
use hostpulse_core::{AppError, AppResult};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(TraceLayer::new_for_http())
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn run_server<F>(state: AppState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.server.bind_address();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    info!("HostPulse server listening on {}", addr);

    serve(listener, state, shutdown).await
}

/// Serve on an already-bound listener.
///
/// When `shutdown` resolves every viewer is disconnected and collection
/// stops; connections still open after the grace period are abandoned.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let engine = state.engine.clone();
    let grace = Duration::from_secs(state.config.server.shutdown_grace_seconds);
    let (draining_tx, mut draining_rx) = watch::channel(false);

    let app = build_app(state);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown signal received, starting graceful shutdown...");
            engine.shutdown();
            let _ = draining_tx.send(true);
        })
        .into_future();

    let grace_expired = async move {
        while !*draining_rx.borrow_and_update() {
            if draining_rx.changed().await.is_err() {
                return std::future::pending::<()>().await;
            }
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;
        }
        _ = grace_expired => {
            warn!(grace_seconds = grace.as_secs(), "Grace period elapsed, abandoning open connections");
        }
    }

    info!("HostPulse server shut down");
    Ok(())
}
