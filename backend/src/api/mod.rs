//! API handlers.

pub mod hooks;
pub mod streams;
pub mod version;
pub mod websocket;
