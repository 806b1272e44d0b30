//! Response bodies of the media server's HTTP status API.

use serde::{Deserialize, Serialize};

/// Body of the media server's stream list (`GET /api/v1/streams/`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaStreamList {
    /// API result code, 0 on success
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub streams: Vec<MediaStreamInfo>,
}

/// One stream known to the media server.
///
/// A stream may stay listed for a while after its encoder disconnects, so
/// presence alone does not mean it is live; check `publish.active`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaStreamInfo {
    /// Stream name, which is the stream key
    pub name: String,
    #[serde(default)]
    pub app: Option<String>,
    /// Number of connected clients
    #[serde(default)]
    pub clients: u32,
    #[serde(default)]
    pub publish: PublishInfo,
}

/// Publishing state of a listed stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishInfo {
    #[serde(default)]
    pub active: bool,
}

impl MediaStreamList {
    /// Find the listed stream whose name matches `stream_key`.
    pub fn find(&self, stream_key: &str) -> Option<&MediaStreamInfo> {
        self.streams.iter().find(|s| s.name == stream_key)
    }
}

impl MediaStreamInfo {
    /// Whether an encoder is currently publishing to this stream.
    pub fn is_publishing(&self) -> bool {
        self.publish.active
    }
}
