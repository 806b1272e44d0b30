//! Registry of open status sockets.
//!
//! Every registered connection receives every broadcast. Liveness follows a
//! one-strike rule: each sweep pings connections that answered the previous
//! ping, and drops those that did not.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use uuid::Uuid;

/// Identifier assigned to a connection when it is registered.
pub type ConnectionId = Uuid;

/// Message queued for delivery to one socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized frame, shared between all recipients of a broadcast
    Text(Arc<str>),
    /// Transport-level ping
    Ping,
    /// Close the socket as unresponsive (close code 1001)
    Close,
}

/// Error returned when a message cannot be handed to a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,
    #[error("outbound queue full")]
    Full,
}

/// Something that accepts outbound messages for one socket without blocking.
pub trait ConnectionSink: Send + Sync {
    fn send(&self, message: Outbound) -> Result<(), SendError>;
}

impl ConnectionSink for mpsc::Sender<Outbound> {
    fn send(&self, message: Outbound) -> Result<(), SendError> {
        self.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Liveness of a connection between two sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Answered the last ping (or has not been pinged yet)
    Responded,
    /// Pinged by the last sweep, no pong yet
    Awaiting,
}

struct Entry {
    sink: Box<dyn ConnectionSink>,
    liveness: Liveness,
}

/// Outcome of one liveness sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections that were sent a ping
    pub pinged: usize,
    /// Connections removed by this sweep
    pub removed: Vec<ConnectionId>,
}

/// Set of currently open connections.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<HashMap<ConnectionId, Entry>>>,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. It starts out as having responded.
    pub fn add(&self, sink: impl ConnectionSink + 'static) -> ConnectionId {
        let id = Uuid::new_v4();
        let mut conns = self.inner.lock();
        conns.insert(
            id,
            Entry {
                sink: Box::new(sink),
                liveness: Liveness::Responded,
            },
        );
        info!("Connection {} registered (total: {})", id, conns.len());
        id
    }

    /// Remove a connection. Dropping its sink ends the socket's writer.
    pub fn remove(&self, id: &ConnectionId) -> bool {
        let mut conns = self.inner.lock();
        let removed = conns.remove(id).is_some();
        if removed {
            info!("Connection {} removed (total: {})", id, conns.len());
        }
        removed
    }

    /// Record a pong from a connection.
    pub fn mark_alive(&self, id: &ConnectionId) {
        if let Some(entry) = self.inner.lock().get_mut(id) {
            trace!("Pong from connection {}", id);
            entry.liveness = Liveness::Responded;
        }
    }

    /// Current liveness of a connection, if it is registered.
    pub fn liveness(&self, id: &ConnectionId) -> Option<Liveness> {
        self.inner.lock().get(id).map(|e| e.liveness)
    }

    pub fn count(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.inner.lock().contains_key(id)
    }

    /// Call `f` for every connection.
    ///
    /// A failure from one connection does not stop the pass; failed
    /// connections are removed once every connection has been visited.
    /// Returns the removed ids.
    pub fn for_each<F>(&self, mut f: F) -> Vec<ConnectionId>
    where
        F: FnMut(ConnectionId, &dyn ConnectionSink) -> Result<(), SendError>,
    {
        let mut conns = self.inner.lock();
        let mut failed = Vec::new();

        for (id, entry) in conns.iter() {
            if let Err(e) = f(*id, entry.sink.as_ref()) {
                debug!("Send to connection {} failed: {}", id, e);
                failed.push(*id);
            }
        }

        for id in &failed {
            conns.remove(id);
        }
        if !failed.is_empty() {
            info!(
                "Removed {} failed connection(s) (total: {})",
                failed.len(),
                conns.len()
            );
        }
        failed
    }

    /// Queue `message` on every connection. Returns how many accepted it.
    pub fn send_all(&self, message: &Outbound) -> usize {
        let mut delivered = 0;
        self.for_each(|_, sink| {
            sink.send(message.clone())?;
            delivered += 1;
            Ok(())
        });
        delivered
    }

    /// Run one liveness sweep.
    ///
    /// Connections still awaiting a pong from the previous sweep are closed
    /// and removed; the rest are pinged and marked as awaiting.
    pub fn sweep(&self) -> SweepReport {
        let mut conns = self.inner.lock();
        let mut report = SweepReport::default();

        for (id, entry) in conns.iter_mut() {
            match entry.liveness {
                Liveness::Awaiting => {
                    debug!("Connection {} missed its pong", id);
                    report.removed.push(*id);
                }
                Liveness::Responded => {
                    entry.liveness = Liveness::Awaiting;
                    match entry.sink.send(Outbound::Ping) {
                        Ok(()) => report.pinged += 1,
                        Err(e) => {
                            debug!("Ping to connection {} failed: {}", id, e);
                            report.removed.push(*id);
                        }
                    }
                }
            }
        }

        for id in &report.removed {
            if let Some(entry) = conns.remove(id) {
                // Best effort; the writer also stops once the sink is dropped
                let _ = entry.sink.send(Outbound::Close);
            }
        }

        if !report.removed.is_empty() {
            info!(
                "Liveness sweep removed {} connection(s) (total: {})",
                report.removed.len(),
                conns.len()
            );
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Sink that records everything it is sent.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub(crate) sent: Arc<Mutex<Vec<Outbound>>>,
    }

    impl RecordingSink {
        pub(crate) fn messages(&self) -> Vec<Outbound> {
            self.sent.lock().clone()
        }

        pub(crate) fn texts(&self) -> Vec<String> {
            self.messages()
                .into_iter()
                .filter_map(|m| match m {
                    Outbound::Text(text) => Some(text.to_string()),
                    _ => None,
                })
                .collect()
        }
    }

    impl ConnectionSink for RecordingSink {
        fn send(&self, message: Outbound) -> Result<(), SendError> {
            self.sent.lock().push(message);
            Ok(())
        }
    }

    /// Sink whose transport is already gone.
    pub(crate) struct ClosedSink;

    impl ConnectionSink for ClosedSink {
        fn send(&self, _message: Outbound) -> Result<(), SendError> {
            Err(SendError::Closed)
        }
    }

    #[test]
    fn test_add_and_remove() {
        let registry = ConnectionRegistry::new();
        let id = registry.add(RecordingSink::default());
        assert_eq!(registry.count(), 1);
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_send_all_isolates_failures() {
        let registry = ConnectionRegistry::new();
        let first = RecordingSink::default();
        let second = RecordingSink::default();
        registry.add(first.clone());
        let broken = registry.add(ClosedSink);
        registry.add(second.clone());

        let delivered = registry.send_all(&Outbound::Text("hello".into()));

        assert_eq!(delivered, 2);
        assert_eq!(first.texts(), vec!["hello"]);
        assert_eq!(second.texts(), vec!["hello"]);
        assert!(!registry.contains(&broken));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_for_each_visits_all_before_removing() {
        let registry = ConnectionRegistry::new();
        registry.add(ClosedSink);
        registry.add(ClosedSink);
        registry.add(RecordingSink::default());

        let mut visited = 0;
        let removed = registry.for_each(|_, sink| {
            visited += 1;
            sink.send(Outbound::Ping)
        });

        assert_eq!(visited, 3);
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_sweep_pings_then_removes_silent_connection() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::default();
        let id = registry.add(sink.clone());

        let report = registry.sweep();
        assert_eq!(report.pinged, 1);
        assert!(report.removed.is_empty());
        assert_eq!(registry.liveness(&id), Some(Liveness::Awaiting));

        // No pong before the next sweep
        let report = registry.sweep();
        assert_eq!(report.removed, vec![id]);
        assert!(!registry.contains(&id));
        assert_eq!(sink.messages(), vec![Outbound::Ping, Outbound::Close]);
    }

    #[test]
    fn test_sweep_keeps_responsive_connection() {
        let registry = ConnectionRegistry::new();
        let id = registry.add(RecordingSink::default());

        for _ in 0..10 {
            let report = registry.sweep();
            assert!(report.removed.is_empty());
            registry.mark_alive(&id);
        }

        assert!(registry.contains(&id));
        assert_eq!(registry.liveness(&id), Some(Liveness::Responded));
    }

    #[test]
    fn test_sweep_removes_connection_whose_ping_fails() {
        let registry = ConnectionRegistry::new();
        let id = registry.add(ClosedSink);

        let report = registry.sweep();
        assert_eq!(report.pinged, 0);
        assert_eq!(report.removed, vec![id]);
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn test_channel_sink_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel::<Outbound>(1);
        assert_eq!(ConnectionSink::send(&tx, Outbound::Ping), Ok(()));
        assert_eq!(ConnectionSink::send(&tx, Outbound::Ping), Err(SendError::Full));

        drop(rx);
        assert_eq!(ConnectionSink::send(&tx, Outbound::Ping), Err(SendError::Closed));
    }
}
