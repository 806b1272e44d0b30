//! Shared types for the restream status service.
//!
//! This crate contains the domain records and wire frames shared between
//! the backend server and the status client.

/// Default port for the restream backend server.
pub const DEFAULT_PORT: u16 = 8080;

/// Close code a client or server sends when it shuts a socket down on purpose.
pub const NORMAL_CLOSE_CODE: u16 = 1000;

pub mod api;
pub mod frames;
pub mod hooks;
pub mod media_server;
pub mod stream;

// Re-export commonly used types
pub use api::{ErrorResponse, HookResponse, StatusListResponse};
pub use frames::{StatusFrame, StatusPayload};
pub use hooks::{HookAction, HookCallback};
pub use media_server::{MediaStreamInfo, MediaStreamList, PublishInfo};
pub use stream::{StreamKey, StreamStatus};
