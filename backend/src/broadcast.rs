//! Stream status broadcasting.
//!
//! `publish` records a status in the cache and fans it out to every open
//! socket; `attach` registers a new socket and hands it the current snapshot.
//! Both run under one ordering lock, so a socket never sees an update that
//! happened before its snapshot, and every socket sees updates for a key in
//! publish order.

use crate::registry::{ConnectionId, ConnectionRegistry, ConnectionSink, Outbound, SendError};
use crate::status_cache::StatusCache;
use parking_lot::Mutex;
use restream_types::{StatusFrame, StatusPayload, StreamStatus};
use std::sync::Arc;
use tracing::{debug, error};

/// Error attaching a new socket.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("failed to serialize frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to send snapshot: {0}")]
    Send(#[from] SendError),
}

/// Fans stream status updates out to every registered connection.
#[derive(Clone)]
pub struct StatusBroadcaster {
    cache: StatusCache,
    registry: ConnectionRegistry,
    order: Arc<Mutex<()>>,
}

impl StatusBroadcaster {
    pub fn new(cache: StatusCache, registry: ConnectionRegistry) -> Self {
        Self {
            cache,
            registry,
            order: Arc::new(Mutex::new(())),
        }
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Store `status` and send it to every open connection.
    ///
    /// There is no staleness check and no redelivery: a status is a latest
    /// value, and a client that misses one gets the next. Returns the number
    /// of connections the frame was queued on.
    pub fn publish(&self, status: StreamStatus) -> usize {
        let _order = self.order.lock();

        let frame = StatusFrame::StreamStatus(StatusPayload::from(&status));
        self.cache.set(status);

        let text = match encode(&frame) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize status frame: {}", e);
                return 0;
            }
        };

        let delivered = self.registry.send_all(&Outbound::Text(text));
        debug!(
            "Broadcast {} to {} connection(s)",
            frame.description(),
            delivered
        );
        delivered
    }

    /// Register a new connection and send it the current snapshot.
    ///
    /// The snapshot goes to this connection only. If it cannot be queued the
    /// connection is not registered.
    pub fn attach(
        &self,
        sink: impl ConnectionSink + 'static,
    ) -> Result<ConnectionId, BroadcastError> {
        let _order = self.order.lock();

        let statuses = self
            .cache
            .snapshot()
            .iter()
            .map(StatusPayload::from)
            .collect();
        let frame = StatusFrame::InitialStatuses { statuses };
        let text = encode(&frame)?;
        sink.send(Outbound::Text(text))?;

        let id = self.registry.add(sink);
        debug!("Sent {} to connection {}", frame.description(), id);
        Ok(id)
    }

    /// Unregister a connection whose socket has gone away.
    pub fn detach(&self, id: &ConnectionId) -> bool {
        self.registry.remove(id)
    }

    /// Wire form of every cached status.
    pub fn snapshot(&self) -> Vec<StatusPayload> {
        self.cache
            .snapshot()
            .iter()
            .map(StatusPayload::from)
            .collect()
    }
}

fn encode(frame: &StatusFrame) -> Result<Arc<str>, serde_json::Error> {
    serde_json::to_string(frame).map(Arc::from)
}
