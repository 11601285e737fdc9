use axum::{extract::Path, http::StatusCode};

use crate::api::extractors::CurrentPrincipal;

/// DELETE /api/admin/users/{user_id}
///
/// User storage lives outside this service; the endpoint only acknowledges the request
/// once the chain has let an authorized caller through.
pub async fn delete_user(
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(user_id): Path<u64>,
) -> StatusCode {
    tracing::info!(subject = %principal.subject(), user_id, "user deletion requested");
    StatusCode::NO_CONTENT
}
