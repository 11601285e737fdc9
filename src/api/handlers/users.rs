use axum::Json;

use crate::api::dto::principal::PrincipalResponse;
use crate::api::extractors::CurrentPrincipal;

/// GET /api/users/me
pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(&principal))
}
