//! Media server callback endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use restream_types::api::HookResponse;
use tracing::{trace, warn};

use crate::state::AppState;

/// Receive a stream or client event from the media server.
///
/// Always answers `200 {"code":0}`. The media server retries or rejects the
/// client on anything else, so processing errors are only logged.
#[utoipa::path(
    post,
    path = "/api/hooks/srs",
    tag = "hooks",
    request_body = restream_types::HookCallback,
    responses(
        (status = 200, description = "Callback acknowledged", body = HookResponse)
    )
)]
pub async fn media_server_hook(State(state): State<AppState>, body: Bytes) -> Json<HookResponse> {
    trace!("Media server callback: {}", String::from_utf8_lossy(&body));

    if let Err(e) = state.webhook().handle(&body) {
        warn!("Ignoring media server callback: {}", e);
    }

    Json(HookResponse::default())
}
