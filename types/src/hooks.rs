//! HTTP callback payloads pushed by the media server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "validation")]
use garde::Validate;
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Callback body posted by the media server on stream and client events.
///
/// Only the fields needed here are modelled; anything else in the body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct HookCallback {
    /// Event tag, e.g. `on_publish`
    #[cfg_attr(feature = "validation", garde(length(min = 1)))]
    pub action: String,
    /// Stream name, which is the stream key
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 256)))]
    pub stream: String,
    /// Application name the stream was published under
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub app: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub vhost: Option<String>,
    /// Address of the publishing or playing client
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub ip: Option<String>,
}

/// Callback actions understood by the webhook endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookAction {
    /// An encoder started publishing
    OnPublish,
    /// An encoder stopped publishing
    OnUnpublish,
    /// A viewer started playing
    OnPlay,
    /// A viewer stopped playing
    OnStop,
}

impl HookAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookAction::OnPublish => "on_publish",
            HookAction::OnUnpublish => "on_unpublish",
            HookAction::OnPlay => "on_play",
            HookAction::OnStop => "on_stop",
        }
    }
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an action tag that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown hook action '{}'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for HookAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_publish" => Ok(HookAction::OnPublish),
            "on_unpublish" => Ok(HookAction::OnUnpublish),
            "on_play" => Ok(HookAction::OnPlay),
            "on_stop" => Ok(HookAction::OnStop),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        assert_eq!("on_publish".parse(), Ok(HookAction::OnPublish));
        assert_eq!("on_unpublish".parse(), Ok(HookAction::OnUnpublish));
        assert_eq!("on_play".parse(), Ok(HookAction::OnPlay));
        assert_eq!("on_stop".parse(), Ok(HookAction::OnStop));
    }

    #[test]
    fn test_parse_unknown_action() {
        let err = "on_dvr".parse::<HookAction>().unwrap_err();
        assert_eq!(err, UnknownAction("on_dvr".to_string()));
    }

    #[test]
    fn test_callback_ignores_extra_fields() {
        let body = r#"{
            "server_id": "vid-0xk989d",
            "action": "on_publish",
            "client_id": "341w361a",
            "ip": "127.0.0.1",
            "vhost": "__defaultVhost__",
            "app": "live",
            "tcUrl": "rtmp://127.0.0.1:1935/live",
            "stream": "abc",
            "param": ""
        }"#;
        let callback: HookCallback = serde_json::from_str(body).unwrap();
        assert_eq!(callback.action, "on_publish");
        assert_eq!(callback.stream, "abc");
        assert_eq!(callback.app.as_deref(), Some("live"));
    }
}
