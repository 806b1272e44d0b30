//! WebSocket driver for the status feed.
//!
//! Runs the socket on a background task, feeding transport events into a
//! [`ReconnectMachine`] and forwarding decoded frames to the caller.

use futures_util::{SinkExt, StreamExt};
use restream_types::StatusFrame;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::reconnect::{ConnectionState, ReconnectAction, ReconnectMachine};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Events delivered to the owner of a [`StatusSocket`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    ConnectionStateChanged(ConnectionState),
    Frame(StatusFrame),
}

/// How an open session ended.
enum SessionEnd {
    /// Peer closed or the transport failed; carries the close code if any
    Closed(Option<u16>),
    /// Owner disabled the socket
    Cancelled,
}

/// Handle to a running status socket.
///
/// Dropping the handle does not stop the task; call [`StatusSocket::disable`].
pub struct StatusSocket {
    cancel: CancellationToken,
    enable: mpsc::UnboundedSender<()>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl StatusSocket {
    /// Start connecting to `url` and report events on `tx`.
    pub fn spawn(url: impl Into<String>, tx: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self::spawn_with(url, tx, ReconnectMachine::new())
    }

    /// Like [`StatusSocket::spawn`], with a caller-supplied reconnect policy.
    pub fn spawn_with(
        url: impl Into<String>,
        tx: mpsc::UnboundedSender<ClientEvent>,
        machine: ReconnectMachine,
    ) -> Self {
        let url = url.into();
        let cancel = CancellationToken::new();
        let (enable, enable_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);

        tracing::info!("Connecting to status socket: {}", url);
        let task = tokio::spawn(connection_loop(
            url,
            tx,
            machine,
            cancel.clone(),
            enable_rx,
            state_tx,
        ));

        Self {
            cancel,
            enable,
            state,
            task,
        }
    }

    /// Last state reported by the connection task.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Connect again with a fresh retry budget. Only acts while disconnected
    /// or given up; ignored while connecting or open.
    pub fn enable(&self) {
        if matches!(
            self.state(),
            ConnectionState::Disconnected | ConnectionState::GivenUp
        ) {
            let _ = self.enable.send(());
        }
    }

    /// Cancel any pending reconnect, close an open socket with the normal close
    /// code and wait for the task to finish.
    pub async fn disable(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Status socket task failed: {}", e);
        }
    }
}

async fn connection_loop(
    url: String,
    tx: mpsc::UnboundedSender<ClientEvent>,
    mut machine: ReconnectMachine,
    cancel: CancellationToken,
    mut enable: mpsc::UnboundedReceiver<()>,
    state: watch::Sender<ConnectionState>,
) {
    let mut action = machine.enable();
    let mut reported = ConnectionState::Disconnected;

    loop {
        if machine.state() != reported {
            reported = machine.state();
            tracing::debug!("Status socket state: {}", reported.description());
            state.send_replace(reported);
            let _ = tx.send(ClientEvent::ConnectionStateChanged(reported));
        }

        action = match action {
            ReconnectAction::Connect => {
                tracing::info!(
                    "Status socket connection attempt {}",
                    machine.failures() + 1
                );
                let result = tokio::select! {
                    _ = cancel.cancelled() => {
                        machine.disable();
                        break;
                    }
                    result = connect_async(url.as_str()) => result,
                };

                match result {
                    Ok((ws, _)) => {
                        machine.opened();
                        reported = machine.state();
                        state.send_replace(reported);
                        let _ = tx.send(ClientEvent::ConnectionStateChanged(reported));
                        // Requests made while reconnecting are satisfied by this open
                        while enable.try_recv().is_ok() {}
                        tracing::info!("Status socket connected");

                        match run_session(ws, &tx, &cancel).await {
                            SessionEnd::Closed(code) => {
                                tracing::warn!("Status socket closed (code {:?})", code);
                                machine.closed(code)
                            }
                            SessionEnd::Cancelled => {
                                machine.disable();
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to connect status socket: {}", e);
                        machine.closed(None)
                    }
                }
            }
            ReconnectAction::ScheduleReconnect(delay) => {
                tracing::info!("Reconnecting in {:?}", delay);
                tokio::select! {
                    _ = cancel.cancelled() => {
                        machine.disable();
                        break;
                    }
                    _ = tokio::time::sleep(delay) => machine.retry_elapsed(),
                    Some(()) = enable.recv() => machine.enable(),
                }
            }
            ReconnectAction::GiveUp => {
                tracing::error!(
                    "Status socket gave up after {} failed attempts",
                    machine.failures()
                );
                ReconnectAction::None
            }
            ReconnectAction::CloseNormally | ReconnectAction::None => {
                // Idle until re-enabled or cancelled
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    Some(()) = enable.recv() => machine.enable(),
                }
            }
        };
    }

    state.send_replace(ConnectionState::Disconnected);
    if reported != ConnectionState::Disconnected {
        let _ = tx.send(ClientEvent::ConnectionStateChanged(
            ConnectionState::Disconnected,
        ));
    }
    tracing::info!("Status socket stopped");
}

async fn run_session(
    mut ws: Socket,
    tx: &mpsc::UnboundedSender<ClientEvent>,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "".into(),
                };
                if let Err(e) = ws.close(Some(frame)).await {
                    tracing::debug!("Error closing status socket: {}", e);
                }
                // Drain until the peer acknowledges the close
                while let Some(Ok(_)) = ws.next().await {}
                return SessionEnd::Cancelled;
            }
            msg = ws.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => {
                tracing::trace!("Received status frame: {}", text);
                match serde_json::from_str::<StatusFrame>(&text) {
                    Ok(frame) => {
                        tracing::debug!("Status frame: {}", frame.description());
                        let _ = tx.send(ClientEvent::Frame(frame));
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse status frame: {}", e);
                    }
                }
            }
            Some(Ok(Message::Close(frame))) => {
                return SessionEnd::Closed(frame.map(|f| u16::from(f.code)));
            }
            Some(Ok(_)) => {
                // Pings are answered by tungstenite
            }
            Some(Err(e)) => {
                tracing::warn!("Status socket error: {}", e);
                return SessionEnd::Closed(None);
            }
            None => return SessionEnd::Closed(None),
        }
    }
}
