//! CORS policy for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Native mobile apps and server-to-server calls are not
//!   restricted by CORS.
//! - This layer is the outermost stage of the security chain, so preflight `OPTIONS`
//!   requests are answered before any authentication logic runs.
//!
//! Policy:
//! - Default: allow any origin, method and header (`*`), WITHOUT credentials.
//! - Tightening is a configuration change (explicit origins, origin patterns such as
//!   `https://*.example.com`, method/header lists), not a structural one.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header, request::Parts};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::ConfigError;

const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allowed_origin_patterns: Vec<String>,
    pub max_age: Option<Duration>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec![WILDCARD.to_string()],
            allowed_methods: vec![WILDCARD.to_string()],
            allowed_headers: vec![WILDCARD.to_string()],
            allowed_origin_patterns: vec![WILDCARD.to_string()],
            max_age: Some(Duration::from_secs(60 * 10)),
        }
    }
}

/// Compiled CORS policy, ready to be layered onto a Router.
#[derive(Debug, Clone)]
pub struct CorsStage {
    layer: CorsLayer,
    allow_methods: Option<HeaderValue>,
    allow_headers: Option<HeaderValue>,
}

impl CorsPolicy {
    /// Validate the policy and build the layer.
    ///
    /// IMPORTANT:
    /// - Credentials are never allowed; wildcard origins cannot be combined with them.
    pub fn compile(&self) -> Result<CorsStage, ConfigError> {
        let mut layer = CorsLayer::new().allow_origin(self.allow_origin()?);

        let allow_methods = if contains_wildcard(&self.allowed_methods) {
            layer = layer.allow_methods(AllowMethods::any());
            Some(HeaderValue::from_static(WILDCARD))
        } else {
            let methods = self
                .allowed_methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                        .map_err(|_| ConfigError::Invalid("CORS_ALLOWED_METHODS"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let value = join_header_value(methods.iter().map(Method::as_str), "CORS_ALLOWED_METHODS")?;
            layer = layer.allow_methods(methods);
            value
        };

        let allow_headers = if contains_wildcard(&self.allowed_headers) {
            layer = layer.allow_headers(AllowHeaders::any());
            Some(HeaderValue::from_static(WILDCARD))
        } else {
            let headers = self
                .allowed_headers
                .iter()
                .map(|h| {
                    HeaderName::from_bytes(h.as_bytes())
                        .map_err(|_| ConfigError::Invalid("CORS_ALLOWED_HEADERS"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let value =
                join_header_value(headers.iter().map(HeaderName::as_str), "CORS_ALLOWED_HEADERS")?;
            layer = layer.allow_headers(headers);
            value
        };

        if let Some(max_age) = self.max_age {
            layer = layer.max_age(max_age);
        }

        Ok(CorsStage {
            layer,
            allow_methods,
            allow_headers,
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        contains_wildcard(&self.allowed_origins) || contains_wildcard(&self.allowed_origin_patterns)
    }

    fn allow_origin(&self) -> Result<AllowOrigin, ConfigError> {
        if self.allows_any_origin() {
            return Ok(AllowOrigin::any());
        }

        // Exact origins plus glob patterns. An empty configuration intentionally allows
        // none (no CORS headers), which is safer than accidentally allowing all.
        let exact: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| ConfigError::Invalid("CORS_ALLOWED_ORIGINS"))
            })
            .collect::<Result<_, _>>()?;

        let patterns: Vec<String> = self
            .allowed_origin_patterns
            .iter()
            .map(|p| p.to_ascii_lowercase())
            .collect();

        Ok(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                exact.iter().any(|v| v == origin)
                    || origin.to_str().is_ok_and(|o| {
                        let o = o.to_ascii_lowercase();
                        patterns.iter().any(|p| wildcard_match(p, &o))
                    })
            },
        ))
    }
}

/// Apply the compiled CORS stage to the given Router.
///
/// `Access-Control-Allow-Methods`/`-Headers` are also set on non-preflight responses
/// (including 401/403 from the inner stages).
pub fn apply(router: Router, stage: &CorsStage) -> Router {
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            stage.allow_methods.clone(),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            stage.allow_headers.clone(),
        ))
        .layer(stage.layer.clone())
}

fn contains_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == WILDCARD)
}

fn join_header_value<'a>(
    values: impl Iterator<Item = &'a str>,
    key: &'static str,
) -> Result<Option<HeaderValue>, ConfigError> {
    let joined = values.collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        return Ok(None);
    }
    HeaderValue::from_str(&joined)
        .map(Some)
        .map_err(|_| ConfigError::Invalid(key))
}

/// `*` matches any run of characters (including none).
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // no wildcard at all
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
