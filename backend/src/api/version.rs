//! Version information API endpoints.

use axum::Json;

use crate::version::VersionInfo;

/// Get version information.
#[utoipa::path(
    get,
    path = "/api/version",
    tag = "System",
    responses(
        (status = 200, description = "Version information", body = VersionInfo)
    )
)]
pub async fn get_version() -> Json<VersionInfo> {
    Json(crate::version::get())
}
