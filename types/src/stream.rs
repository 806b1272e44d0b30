//! Stream keys and the status record kept for each of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Opaque identifier of one ingest/viewer channel.
///
/// Keys are issued elsewhere and never change; this crate only compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(transparent)]
pub struct StreamKey(String);

impl StreamKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A key made only of whitespace identifies nothing.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StreamKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for StreamKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl AsRef<str> for StreamKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StreamKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Last known liveness of one stream.
///
/// A status is always replaced as a whole; there is no partial merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStatus {
    pub stream_key: StreamKey,
    pub is_live: bool,
    pub viewer_count: u32,
    pub last_checked_at: DateTime<Utc>,
}

impl StreamStatus {
    /// Status of a stream that is publishing, stamped with the current time.
    pub fn live(stream_key: StreamKey, viewer_count: u32) -> Self {
        Self {
            stream_key,
            is_live: true,
            viewer_count,
            last_checked_at: Utc::now(),
        }
    }

    /// Status of a stream that is not publishing. Offline streams have no viewers.
    pub fn offline(stream_key: StreamKey) -> Self {
        Self {
            stream_key,
            is_live: false,
            viewer_count: 0,
            last_checked_at: Utc::now(),
        }
    }

    /// Whether the given liveness and viewer count would look any different to a viewer.
    pub fn differs_from(&self, is_live: bool, viewer_count: u32) -> bool {
        self.is_live != is_live || self.viewer_count != viewer_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_offline_has_no_viewers() {
        let status = StreamStatus::offline(StreamKey::from("abc"));
        assert!(!status.is_live);
        assert_eq!(status.viewer_count, 0);
    }

    #[test]
    fn test_key_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(StreamKey::from("abc"), 1);
        assert_eq!(map.get("abc"), Some(&1));
    }

    #[test]
    fn test_blank_key() {
        assert!(StreamKey::from("  ").is_blank());
        assert!(!StreamKey::from("abc").is_blank());
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let json = serde_json::to_string(&StreamKey::from("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
