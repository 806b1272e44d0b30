//! Client side of the restream status feed.
//!
//! Connects to the server's status socket, keeps it open with a bounded
//! reconnect budget, and folds incoming frames into a local view.

pub mod reconnect;
pub mod view;
pub mod ws;

pub use reconnect::{ConnectionState, ReconnectAction, ReconnectMachine};
pub use view::{StatusChange, StatusView};
pub use ws::{ClientEvent, StatusSocket};
