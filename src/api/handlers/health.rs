/*
 * Responsibility
 * - GET /api/public/health (疎通用)
 * - public path なので token 無しでも届く
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
