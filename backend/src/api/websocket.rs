//! WebSocket endpoint for real-time stream status updates.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::select;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

use crate::registry::Outbound;
use crate::state::AppState;

/// WebSocket endpoint for stream status updates.
///
/// On connect the server sends one `initial_statuses` frame with every known
/// status, then a `stream_status` frame whenever any stream's status is
/// published. The server pings periodically; a socket that misses one pong is
/// closed.
///
/// Example usage from JavaScript:
/// ```javascript
/// const ws = new WebSocket('ws://localhost:8080/api/ws');
/// ws.onmessage = (event) => {
///     const frame = JSON.parse(event.data);
///     if (frame.type === 'stream_status') console.log(frame.streamKey, frame.isLive);
/// };
/// ```
#[utoipa::path(
    get,
    path = "/api/ws",
    tag = "websocket",
    responses(
        (status = 101, description = "WebSocket connection upgraded")
    )
)]
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!(
        "New WebSocket client connecting (total connections: {})",
        state.registry().count() + 1
    );
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Frames are queued here by the broadcaster and the liveness sweep
    let (tx, mut rx) = mpsc::channel::<Outbound>(state.send_buffer());

    let id = match state.broadcaster().attach(tx) {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to register WebSocket client: {}", e);
            return;
        }
    };

    info!("WebSocket client {} connected", id);

    loop {
        select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(Outbound::Text(text)) => {
                        trace!("Sending frame to client {}", id);
                        if let Err(e) = sender.send(Message::Text(text.to_string().into())).await {
                            debug!("Failed to send frame, client likely disconnected: {}", e);
                            break;
                        }
                    }
                    Some(Outbound::Ping) => {
                        trace!("Sending ping to client {}", id);
                        if let Err(e) = sender.send(Message::Ping(vec![].into())).await {
                            debug!("Failed to send ping, client likely disconnected: {}", e);
                            break;
                        }
                    }
                    Some(Outbound::Close) => {
                        info!("Closing unresponsive client {}", id);
                        // A NORMAL code would stop the client from reconnecting
                        let _ = sender
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::AWAY,
                                reason: "unresponsive".into(),
                            })))
                            .await;
                        break;
                    }
                    None => {
                        // Dropped from the registry after a failed send
                        debug!("Client {} no longer registered", id);
                        break;
                    }
                }
            }

            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Pong(_))) => {
                        state.registry().mark_alive(&id);
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} sent close message", id);
                        break;
                    }
                    Some(Ok(_)) => {
                        trace!("Received other message type from client");
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("Client {} disconnected", id);
                        break;
                    }
                }
            }
        }
    }

    state.broadcaster().detach(&id);
    info!("WebSocket client {} disconnected", id);
}
