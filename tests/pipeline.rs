//! End-to-end behaviour of the assembled application (chain + demo API).

use std::collections::HashMap;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use bearer_gate::app::build_app;
use bearer_gate::config::Config;
use bearer_gate::services::auth::build_token_verifier;
use jsonwebtoken::{Algorithm, EncodingKey, Header, get_current_timestamp};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";

fn app() -> Router {
    app_with(&[])
}

fn app_with(overrides: &[(&'static str, &'static str)]) -> Router {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("ACCESS_JWT_SECRET", SECRET),
        ("AUTH_ISSUER", "https://issuer.test"),
        ("ACCESS_TOKEN_LEEWAY_SECONDS", "0"),
        ("PUBLIC_PATHS", "GET /api/public/**"),
        ("AUTHORITY_RULES", "* /api/admin/**=ROLE_ADMIN"),
    ]);
    vars.extend(overrides.iter().copied());
    let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    let verifier = build_token_verifier(&config.auth).unwrap();

    build_app(&config, verifier).unwrap()
}

fn token(sub: &str, roles: &[&str], exp: u64) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "sub": sub,
            "iss": "https://issuer.test",
            "exp": exp,
            "roles": roles,
        }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn valid_token(sub: &str, roles: &[&str]) -> String {
    token(sub, roles, get_current_timestamp() + 3600)
}

fn request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder.body(Body::empty()).unwrap()
}

async fn send(req: Request<Body>) -> Response {
    app().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn public_health_needs_no_token() {
    let response = send(request(Method::GET, "/api/public/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn public_get_rule_also_admits_head() {
    let response = send(request(Method::HEAD, "/api/public/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_health_ignores_invalid_token() {
    let expired = token("alice", &[], get_current_timestamp() - 3600);

    for bearer in ["garbage", expired.as_str()] {
        let response = send(request(Method::GET, "/api/public/health", Some(bearer))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn protected_path_without_header_is_unauthenticated() {
    let response = send(request(Method::GET, "/api/users/me", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "authentication required");
}

#[tokio::test]
async fn expired_token_is_unauthenticated() {
    let expired = token("alice", &["ROLE_USER"], get_current_timestamp() - 3600);
    let response = send(request(Method::GET, "/api/users/me", Some(&expired))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn every_token_failure_looks_the_same() {
    let expired = token("alice", &[], get_current_timestamp() - 3600);
    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": "alice", "iss": "https://issuer.test", "exp": get_current_timestamp() + 3600}),
        &EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();

    let baseline = json_body(send(request(Method::GET, "/api/users/me", None)).await).await;

    for bearer in ["garbage", expired.as_str(), forged.as_str()] {
        let response = send(request(Method::GET, "/api/users/me", Some(bearer))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, baseline);
    }
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthenticated() {
    let req = Request::builder()
        .uri("/api/users/me")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();

    assert_eq!(send(req).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_endpoint_with_principal() {
    let bearer = valid_token("alice", &["ROLE_USER"]);
    let response = send(request(Method::GET, "/api/users/me", Some(&bearer))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subject"], "alice");
    assert_eq!(body["authorities"], json!(["ROLE_USER"]));
}

#[tokio::test]
async fn admin_route_without_admin_role_is_forbidden() {
    let bearer = valid_token("alice", &["ROLE_USER"]);
    let response = send(request(Method::DELETE, "/api/admin/users/5", Some(&bearer))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn admin_route_without_token_is_unauthenticated_not_forbidden() {
    let response = send(request(Method::DELETE, "/api/admin/users/5", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_route_with_admin_role_is_allowed() {
    let bearer = valid_token("ada", &["ROLE_ADMIN"]);
    let response = send(request(Method::DELETE, "/api/admin/users/5", Some(&bearer))).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_path_does_not_reveal_existence() {
    let unknown = send(request(Method::GET, "/api/nothing/here", None)).await;
    let known = send(request(Method::GET, "/api/users/me", None)).await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(unknown).await, json_body(known).await);

    // once authenticated, the business router owns the answer
    let bearer = valid_token("alice", &[]);
    let response = send(request(Method::GET, "/api/nothing/here", Some(&bearer))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preflight_is_answered_without_authentication() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/users/me")
        .header(header::ORIGIN, "https://somewhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap();

    let response = send(req).await;

    assert!(response.status().is_success());
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
}

#[tokio::test]
async fn cors_headers_are_present_on_failures_too() {
    let req = Request::builder()
        .uri("/api/users/me")
        .header(header::ORIGIN, "https://somewhere.example")
        .body(Body::empty())
        .unwrap();

    let response = send(req).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
}

#[tokio::test]
async fn explicit_origin_list_restricts_cors() {
    let app = app_with(&[("CORS_ALLOWED_ORIGINS", "https://app.example")]);
    let from = |origin: &str| {
        Request::builder()
            .uri("/api/public/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    };

    let foreign = app.clone().oneshot(from("https://evil.example")).await.unwrap();
    assert_eq!(foreign.status(), StatusCode::OK);
    assert!(
        !foreign
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );

    let allowed = app.oneshot(from("https://app.example")).await.unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example"
    );
}

#[tokio::test]
async fn identical_requests_get_identical_outcomes() {
    let app = app();
    let bearer = valid_token("alice", &["ROLE_USER"]);

    for (method, uri, token) in [
        (Method::GET, "/api/users/me", None),
        (Method::GET, "/api/users/me", Some(bearer.as_str())),
        (Method::DELETE, "/api/admin/users/5", Some(bearer.as_str())),
        (Method::GET, "/api/public/health", None),
    ] {
        let first = app
            .clone()
            .oneshot(request(method.clone(), uri, token))
            .await
            .unwrap();
        let second = app
            .clone()
            .oneshot(request(method, uri, token))
            .await
            .unwrap();

        assert_eq!(first.status(), second.status(), "{uri}");
    }
}

#[tokio::test]
async fn request_id_is_propagated() {
    let response = send(request(Method::GET, "/api/public/health", None)).await;
    assert!(response.headers().contains_key("x-request-id"));
}
