//! WebSocket client decoding binary frames into snapshots.

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use hostpulse_core::error::ErrorKind;
use hostpulse_core::types::MetricSnapshot;
use hostpulse_core::{AppError, AppResult};

/// Connection to a HostPulse `/ws` endpoint.
pub struct ViewerClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ViewerClient {
    /// Open the WebSocket.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let (stream, response) = connect_async(url).await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, format!("Failed to connect to {url}"), e)
        })?;
        info!(url, status = %response.status(), "Connected to HostPulse");
        Ok(Self { stream })
    }

    /// Next decoded snapshot, or `None` once the server closes the stream.
    ///
    /// Non-binary messages are skipped.
    pub async fn next_snapshot(&mut self) -> AppResult<Option<MetricSnapshot>> {
        while let Some(message) = self.stream.next().await {
            let message = message.map_err(|e| {
                AppError::with_source(ErrorKind::Transport, "WebSocket receive failed", e)
            })?;
            match message {
                Message::Binary(payload) => return MetricSnapshot::from_msgpack(&payload).map(Some),
                Message::Close(frame) => {
                    debug!(?frame, "Server closed the stream");
                    return Ok(None);
                }
                other => debug!(kind = ?other, "Ignoring non-binary message"),
            }
        }
        Ok(None)
    }

    /// Send a close frame and wait for the server to acknowledge it.
    pub async fn close(mut self) -> AppResult<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "WebSocket close failed", e))?;
        // Drain until the close handshake completes.
        while let Some(Ok(_)) = self.stream.next().await {}
        Ok(())
    }
}

/// The part of `/api/health` the viewer cares about.
#[derive(Debug, Deserialize)]
struct ServerHealth {
    window_capacity: usize,
}

/// Map a `ws://host/ws` stream URL to the server's health endpoint.
pub fn health_url(ws_url: &str) -> AppResult<String> {
    let (scheme, rest) = ws_url
        .split_once("://")
        .ok_or_else(|| AppError::validation(format!("not a WebSocket URL: {ws_url}")))?;
    let scheme = match scheme.to_ascii_lowercase().as_str() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => {
            return Err(AppError::validation(format!(
                "unsupported URL scheme '{other}'"
            )));
        }
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.is_empty() {
        return Err(AppError::validation(format!("missing host in {ws_url}")));
    }
    Ok(format!("{scheme}://{authority}/api/health"))
}

/// Rolling window capacity configured on the server.
pub async fn fetch_window_capacity(ws_url: &str) -> AppResult<usize> {
    let url = health_url(ws_url)?;
    let health: ServerHealth = reqwest::get(&url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| AppError::with_source(ErrorKind::Transport, format!("GET {url} failed"), e))?
        .json()
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Serialization, "Invalid health response", e)
        })?;
    debug!(url, window_capacity = health.window_capacity, "Fetched server window capacity");
    Ok(health.window_capacity)
}
