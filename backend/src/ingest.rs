//! Producers of stream status updates.
//!
//! Two adapters feed the broadcaster: the webhook adapter reacts to callbacks
//! pushed by the media server, and the poll adapter asks the media server
//! directly when a client requests a status check. Raw inputs are turned into
//! an [`IngestEvent`] at the boundary before anything is published.

use crate::broadcast::StatusBroadcaster;
use crate::media_server::{MediaServer, MediaServerError};
use garde::Validate;
use restream_types::hooks::UnknownAction;
use restream_types::{HookAction, HookCallback, MediaStreamList, StreamKey, StreamStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Validated input from one of the ingestion sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// An encoder started publishing
    Publish { stream_key: StreamKey },
    /// An encoder stopped publishing
    Unpublish { stream_key: StreamKey },
    /// A viewer started playing
    ViewerJoin { stream_key: StreamKey },
    /// A viewer stopped playing
    ViewerLeave { stream_key: StreamKey },
    /// Result of asking the media server about one stream
    Poll(PollResult),
}

/// What the media server said about one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub stream_key: StreamKey,
    pub is_live: bool,
    pub viewer_count: u32,
}

impl PollResult {
    /// Read the status of `stream_key` out of the media server's stream list.
    ///
    /// A stream counts as live only while it is publishing; a listed stream
    /// with no active publisher is offline.
    pub fn from_stream_list(stream_key: StreamKey, list: &MediaStreamList) -> Self {
        match list.find(stream_key.as_str()) {
            Some(stream) if stream.is_publishing() => Self {
                stream_key,
                is_live: true,
                viewer_count: stream.clients,
            },
            _ => Self::offline(stream_key),
        }
    }

    pub fn offline(stream_key: StreamKey) -> Self {
        Self {
            stream_key,
            is_live: false,
            viewer_count: 0,
        }
    }

    pub fn into_status(self) -> StreamStatus {
        if self.is_live {
            StreamStatus::live(self.stream_key, self.viewer_count)
        } else {
            StreamStatus::offline(self.stream_key)
        }
    }
}

/// Error turning a callback body into an event.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("malformed callback body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid callback: {0}")]
    Invalid(garde::Report),

    #[error("stream key is blank")]
    BlankStreamKey,

    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),
}

impl IngestEvent {
    /// Validate a callback and map its action tag.
    pub fn from_callback(callback: &HookCallback) -> Result<Self, WebhookError> {
        callback.validate().map_err(WebhookError::Invalid)?;

        let action: HookAction = callback.action.parse()?;
        let stream_key = StreamKey::from(callback.stream.as_str());
        if stream_key.is_blank() {
            return Err(WebhookError::BlankStreamKey);
        }
        Ok(match action {
            HookAction::OnPublish => IngestEvent::Publish { stream_key },
            HookAction::OnUnpublish => IngestEvent::Unpublish { stream_key },
            HookAction::OnPlay => IngestEvent::ViewerJoin { stream_key },
            HookAction::OnStop => IngestEvent::ViewerLeave { stream_key },
        })
    }

    pub fn stream_key(&self) -> &StreamKey {
        match self {
            IngestEvent::Publish { stream_key }
            | IngestEvent::Unpublish { stream_key }
            | IngestEvent::ViewerJoin { stream_key }
            | IngestEvent::ViewerLeave { stream_key } => stream_key,
            IngestEvent::Poll(result) => &result.stream_key,
        }
    }

    /// Status this event implies, if it implies one.
    ///
    /// Viewer join/leave callbacks carry no status: viewer counts are only
    /// refreshed by polling.
    pub fn into_status(self) -> Option<StreamStatus> {
        match self {
            IngestEvent::Publish { stream_key } => Some(StreamStatus::live(stream_key, 0)),
            IngestEvent::Unpublish { stream_key } => Some(StreamStatus::offline(stream_key)),
            IngestEvent::ViewerJoin { .. } | IngestEvent::ViewerLeave { .. } => None,
            IngestEvent::Poll(result) => Some(result.into_status()),
        }
    }
}

/// Turns media server callbacks into published statuses.
#[derive(Clone)]
pub struct WebhookAdapter {
    broadcaster: StatusBroadcaster,
}

impl WebhookAdapter {
    pub fn new(broadcaster: StatusBroadcaster) -> Self {
        Self { broadcaster }
    }

    /// Handle a raw callback body. Returns the published status, if any.
    pub fn handle(&self, body: &[u8]) -> Result<Option<StreamStatus>, WebhookError> {
        let callback: HookCallback = serde_json::from_slice(body)?;
        let event = IngestEvent::from_callback(&callback)?;
        Ok(self.apply(event))
    }

    /// Publish the status implied by `event`.
    pub fn apply(&self, event: IngestEvent) -> Option<StreamStatus> {
        publish_event(&self.broadcaster, event)
    }
}

/// Publish the status an event implies. Returns it, or `None` for events
/// that carry no status.
fn publish_event(broadcaster: &StatusBroadcaster, event: IngestEvent) -> Option<StreamStatus> {
    let key = event.stream_key().clone();
    match event.into_status() {
        Some(status) => {
            info!(
                "Stream '{}' is now {}",
                key,
                if status.is_live { "live" } else { "offline" }
            );
            broadcaster.publish(status.clone());
            Some(status)
        }
        None => {
            debug!("Viewer callback for stream '{}' accepted without update", key);
            None
        }
    }
}

/// Asks the media server for a stream's status on demand.
#[derive(Clone)]
pub struct PollAdapter {
    broadcaster: StatusBroadcaster,
    media_server: Arc<dyn MediaServer>,
    timeout: Duration,
}

impl PollAdapter {
    pub fn new(
        broadcaster: StatusBroadcaster,
        media_server: Arc<dyn MediaServer>,
        timeout: Duration,
    ) -> Self {
        Self {
            broadcaster,
            media_server,
            timeout,
        }
    }

    /// Query the media server about one stream.
    ///
    /// Errors and timeouts are logged and reported as offline.
    pub async fn poll(&self, stream_key: StreamKey) -> PollResult {
        let list = match tokio::time::timeout(self.timeout, self.media_server.list_streams()).await
        {
            Ok(result) => result,
            Err(_) => Err(MediaServerError::Timeout(self.timeout)),
        };

        match list {
            Ok(list) => PollResult::from_stream_list(stream_key, &list),
            Err(e) => {
                warn!(
                    "Status query for stream '{}' failed, assuming offline: {}",
                    stream_key, e
                );
                PollResult::offline(stream_key)
            }
        }
    }

    /// Poll one stream, publish the result and return it.
    pub async fn check(&self, stream_key: StreamKey) -> StreamStatus {
        let result = self.poll(stream_key).await;
        let fallback = result.stream_key.clone();
        publish_event(&self.broadcaster, IngestEvent::Poll(result))
            .unwrap_or_else(|| StreamStatus::offline(fallback))
    }
}
