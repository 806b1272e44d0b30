//! OpenAPI documentation configuration.

use crate::version::VersionInfo;
use restream_types::api::{ErrorResponse, HookResponse, StatusListResponse};
use restream_types::{HookCallback, StatusPayload};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::hooks::media_server_hook,
        crate::api::streams::get_stream_status,
        crate::api::streams::list_statuses,
        crate::api::websocket::websocket_handler,
        crate::api::version::get_version,
    ),
    components(
        schemas(
            HookCallback,
            HookResponse,
            StatusPayload,
            StatusListResponse,
            ErrorResponse,
            VersionInfo,
        )
    ),
    tags(
        (name = "hooks", description = "Callbacks from the media server"),
        (name = "streams", description = "Stream status endpoints"),
        (name = "websocket", description = "Real-time status socket"),
        (name = "System", description = "System information endpoints")
    ),
    info(
        title = "Restream Status API",
        version = "0.1.0",
        description = "Live/offline status of restreamed RTMP streams, pushed to dashboards over WebSocket",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;
