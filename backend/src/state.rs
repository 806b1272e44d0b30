//! Application state management.

use crate::broadcast::StatusBroadcaster;
use crate::config::Config;
use crate::ingest::{PollAdapter, WebhookAdapter};
use crate::media_server::{HttpMediaServer, MediaServer};
use crate::registry::ConnectionRegistry;
use crate::status_cache::StatusCache;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
///
/// Built once by the entry point and handed to every HTTP and socket handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Status fan-out (owns the cache and the connection registry)
    broadcaster: StatusBroadcaster,
    /// Media server callback handling
    webhook: WebhookAdapter,
    /// On-demand media server queries
    poll: PollAdapter,
    /// Outbound frame queue depth per socket
    send_buffer: usize,
}

impl AppState {
    /// Create application state talking to the given media server.
    pub fn new(
        media_server: Arc<dyn MediaServer>,
        poll_timeout: Duration,
        send_buffer: usize,
    ) -> Self {
        let broadcaster = StatusBroadcaster::new(StatusCache::new(), ConnectionRegistry::new());
        Self {
            inner: Arc::new(AppStateInner {
                webhook: WebhookAdapter::new(broadcaster.clone()),
                poll: PollAdapter::new(broadcaster.clone(), media_server, poll_timeout),
                broadcaster,
                send_buffer,
            }),
        }
    }

    /// Create application state from configuration, querying the media server over HTTP.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpMediaServer::new(config.media_server_url.clone())),
            config.media_server_timeout,
            config.send_buffer,
        )
    }

    /// Get the status broadcaster.
    pub fn broadcaster(&self) -> &StatusBroadcaster {
        &self.inner.broadcaster
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        self.inner.broadcaster.registry()
    }

    /// Get the status cache.
    pub fn cache(&self) -> &StatusCache {
        self.inner.broadcaster.cache()
    }

    pub fn webhook(&self) -> &WebhookAdapter {
        &self.inner.webhook
    }

    pub fn poll(&self) -> &PollAdapter {
        &self.inner.poll
    }

    pub fn send_buffer(&self) -> usize {
        self.inner.send_buffer
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
