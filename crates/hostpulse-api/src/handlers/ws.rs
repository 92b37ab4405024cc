//! WebSocket upgrade handler: one hub client per socket.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use hostpulse_core::error::ErrorKind;
use hostpulse_core::{AppError, AppResult};
use hostpulse_stream::{Frame, FrameTransport};

use crate::state::AppState;

/// Writes each frame as one binary WebSocket message.
pub struct WsTransport {
    sink: SplitSink<WebSocket, Message>,
}

impl WsTransport {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl FrameTransport for WsTransport {
    async fn deliver(&mut self, frame: &Frame) -> AppResult<()> {
        self.sink
            .send(Message::Binary(frame.payload().clone()))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "WebSocket send failed", e))
    }

    async fn close(&mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
    }
}

/// GET /ws
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Registers the socket with the hub and watches the inbound side for close.
async fn handle_socket(state: AppState, socket: WebSocket) {
    let (ws_tx, mut ws_rx) = socket.split();
    let handle = state.engine.hub.register_client(WsTransport::new(ws_tx));
    let client_id = handle.id();

    info!(client_id = %client_id, "WebSocket connection established");

    // Inbound messages carry nothing; pings are answered by axum.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(client_id = %client_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    handle.unregister();
    info!(client_id = %client_id, "WebSocket connection closed");
}
