//! Version information embedded at compile time.

use serde::Serialize;
use utoipa::ToSchema;

/// Build and version information
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VersionInfo {
    /// Package name from Cargo.toml
    pub name: &'static str,
    /// Package version from Cargo.toml
    pub version: &'static str,
}

/// Get the current version information.
pub fn get() -> VersionInfo {
    VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    }
}
