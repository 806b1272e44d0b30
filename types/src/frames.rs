//! Frames pushed from the server to browser sockets.

use crate::stream::{StreamKey, StreamStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Wire shape of one stream status.
///
/// Used both inside socket frames and as the status-check response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub stream_key: StreamKey,
    pub is_live: bool,
    pub viewers: u32,
    pub last_checked: DateTime<Utc>,
}

impl From<&StreamStatus> for StatusPayload {
    fn from(status: &StreamStatus) -> Self {
        Self {
            stream_key: status.stream_key.clone(),
            is_live: status.is_live,
            viewers: status.viewer_count,
            last_checked: status.last_checked_at,
        }
    }
}

impl From<StreamStatus> for StatusPayload {
    fn from(status: StreamStatus) -> Self {
        Self {
            stream_key: status.stream_key,
            is_live: status.is_live,
            viewers: status.viewer_count,
            last_checked: status.last_checked_at,
        }
    }
}

impl From<StatusPayload> for StreamStatus {
    fn from(payload: StatusPayload) -> Self {
        Self {
            stream_key: payload.stream_key,
            is_live: payload.is_live,
            viewer_count: payload.viewers,
            last_checked_at: payload.last_checked,
        }
    }
}

/// Frames the server sends over the status socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusFrame {
    /// Full cache contents, sent once to a newly connected socket
    InitialStatuses { statuses: Vec<StatusPayload> },
    /// One status update, sent to every open socket
    StreamStatus(StatusPayload),
}

impl StatusFrame {
    /// Get a short description of the frame for logging.
    pub fn description(&self) -> String {
        match self {
            StatusFrame::InitialStatuses { statuses } => {
                format!("initial snapshot with {} statuses", statuses.len())
            }
            StatusFrame::StreamStatus(payload) => format!(
                "stream '{}' live={} viewers={}",
                payload.stream_key, payload.is_live, payload.viewers
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(key: &str, is_live: bool, viewers: u32) -> StatusPayload {
        StatusPayload {
            stream_key: StreamKey::from(key),
            is_live,
            viewers,
            last_checked: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_stream_status_frame_shape() {
        let frame = StatusFrame::StreamStatus(payload("abc", true, 3));
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "stream_status",
                "streamKey": "abc",
                "isLive": true,
                "viewers": 3,
                "lastChecked": "2024-05-01T12:00:00Z",
            })
        );
    }

    #[test]
    fn test_initial_statuses_frame_shape() {
        let frame = StatusFrame::InitialStatuses {
            statuses: vec![payload("abc", false, 0)],
        };
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["type"], "initial_statuses");
        assert_eq!(value["statuses"][0]["streamKey"], "abc");
        assert_eq!(value["statuses"][0]["isLive"], false);
    }

    #[test]
    fn test_parse_frame_from_server_text() {
        let text = r#"{"type":"stream_status","streamKey":"xyz","isLive":false,"viewers":0,"lastChecked":"2024-05-01T12:00:00Z"}"#;
        let frame: StatusFrame = serde_json::from_str(text).unwrap();
        assert_eq!(frame, StatusFrame::StreamStatus(payload("xyz", false, 0)));
    }

    #[test]
    fn test_status_conversion_renames_fields() {
        let status = StreamStatus::live(StreamKey::from("abc"), 7);
        let payload = StatusPayload::from(&status);
        assert_eq!(payload.viewers, 7);
        assert_eq!(payload.last_checked, status.last_checked_at);
    }
}
