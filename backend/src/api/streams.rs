//! Stream status API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use restream_types::{ErrorResponse, StatusListResponse, StatusPayload, StreamKey};
use tracing::debug;

use crate::state::AppState;

/// Check whether a stream is live.
///
/// Asks the media server, broadcasts the answer to every open socket and
/// returns it. An unreachable media server yields an offline status, not an error.
#[utoipa::path(
    get,
    path = "/api/streams/{stream_key}/status",
    tag = "streams",
    params(
        ("stream_key" = String, Path, description = "Stream key")
    ),
    responses(
        (status = 200, description = "Current stream status", body = StatusPayload),
        (status = 400, description = "Blank stream key", body = ErrorResponse)
    )
)]
pub async fn get_stream_status(
    State(state): State<AppState>,
    Path(stream_key): Path<String>,
) -> Result<Json<StatusPayload>, (StatusCode, Json<ErrorResponse>)> {
    let stream_key = StreamKey::from(stream_key);
    if stream_key.is_blank() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Stream key must not be empty")),
        ));
    }

    debug!("Status check requested for stream '{}'", stream_key);
    let status = state.poll().check(stream_key).await;
    Ok(Json(StatusPayload::from(status)))
}

/// List every stream status known to the server.
#[utoipa::path(
    get,
    path = "/api/streams/statuses",
    tag = "streams",
    responses(
        (status = 200, description = "Cached stream statuses", body = StatusListResponse)
    )
)]
pub async fn list_statuses(State(state): State<AppState>) -> Json<StatusListResponse> {
    Json(StatusListResponse {
        statuses: state.broadcaster().snapshot(),
    })
}
