//! Authorization decision stage: the single point that turns "no principal" into 401
//! and "not enough authority" into 403.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::security::{
    AccessDeniedHandler, AccessPolicy, AuthenticationEntryPoint, Decision, Principal,
};

#[derive(Clone)]
pub struct AuthorizationStage {
    policy: Arc<AccessPolicy>,
    entry_point: Arc<dyn AuthenticationEntryPoint>,
    access_denied: Arc<dyn AccessDeniedHandler>,
}

impl AuthorizationStage {
    pub fn new(
        policy: Arc<AccessPolicy>,
        entry_point: Arc<dyn AuthenticationEntryPoint>,
        access_denied: Arc<dyn AccessDeniedHandler>,
    ) -> Self {
        Self {
            policy,
            entry_point,
            access_denied,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

pub fn apply(router: Router, stage: AuthorizationStage) -> Router {
    router.layer(middleware::from_fn_with_state(stage, authorize_middleware))
}

async fn authorize_middleware(
    State(stage): State<AuthorizationStage>,
    OriginalUri(original_uri): OriginalUri,
    req: Request<Body>,
    next: Next,
) -> Response {
    let principal = req.extensions().get::<Principal>();
    let decision = stage
        .policy
        .decide(req.method(), original_uri.path(), principal);

    tracing::debug!(
        method = %req.method(),
        path = %original_uri.path(),
        subject = principal.map(Principal::subject),
        ?decision,
        "authorization decision"
    );

    match decision {
        Decision::Allowed => next.run(req).await,
        Decision::Unauthenticated => stage.entry_point.commence(&req),
        Decision::Unauthorized => match req.extensions().get::<Principal>() {
            Some(principal) => stage.access_denied.handle(&req, principal),
            None => stage.entry_point.commence(&req),
        },
    }
}
