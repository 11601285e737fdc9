//! Terminal failure handlers.
//!
//! The authorization stage decides *which* failure happened; these turn the
//! outcome into a response. Swapping the response format means swapping the
//! handler, the decision logic stays untouched.

use axum::{
    body::Body,
    http::{HeaderValue, Request, header},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::security::principal::Principal;

/// Invoked when a non-public request has no valid principal (401).
pub trait AuthenticationEntryPoint: Send + Sync + 'static {
    fn commence(&self, req: &Request<Body>) -> Response;
}

/// Invoked when a principal is present but lacks the required authority (403).
pub trait AccessDeniedHandler: Send + Sync + 'static {
    fn handle(&self, req: &Request<Body>, principal: &Principal) -> Response;
}

/// 401 with `WWW-Authenticate: Bearer` and the generic JSON error body.
///
/// The body is the same for every path and every token failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAuthenticationEntryPoint;

impl AuthenticationEntryPoint for JsonAuthenticationEntryPoint {
    fn commence(&self, req: &Request<Body>) -> Response {
        tracing::debug!(method = %req.method(), path = %req.uri().path(), "authentication required");

        let mut response = AppError::Unauthorized.into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer"),
        );
        response
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAccessDeniedHandler;

impl AccessDeniedHandler for JsonAccessDeniedHandler {
    fn handle(&self, req: &Request<Body>, principal: &Principal) -> Response {
        tracing::info!(
            method = %req.method(),
            path = %req.uri().path(),
            subject = %principal.subject(),
            "access denied"
        );

        AppError::Forbidden.into_response()
    }
}
