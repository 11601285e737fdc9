//! access token 検証 → Principal を extensions に入れる
//!
//! - `Authorization: Bearer <token>` を取り出し、TokenVerifier に委譲する
//! - 成功時のみ Principal を request extensions に格納する
//! - 失敗しても response は返さない (401 への変換は authorize stage の責務)

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::security::Principal;
use crate::services::auth::TokenVerifier;

pub fn apply(router: Router, verifier: Arc<dyn TokenVerifier>) -> Router {
    router.layer(middleware::from_fn_with_state(verifier, token_middleware))
}

async fn token_middleware(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(principal) = authenticate(verifier.as_ref(), req.headers()) {
        // middleware → authorize stage / extractor への受け渡し
        req.extensions_mut().insert(principal);
    }

    next.run(req).await
}

/// Resolve the principal for a request, or `None` if it carries no usable token.
pub fn authenticate(verifier: &dyn TokenVerifier, headers: &HeaderMap) -> Option<Principal> {
    let token = bearer_token(headers)?;

    match verifier.verify(token) {
        Ok(principal) => {
            tracing::debug!(subject = %principal.subject(), jti = ?principal.token_id(), "access token accepted");
            Some(principal)
        }
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            None
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively (RFC 6750); an empty token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
