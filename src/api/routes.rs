/*
 * Responsibility
 * - URL 構造を定義
 * - 認証の要否はここでは決めない (security chain の public paths / authority rules で決める)
 */
use axum::{
    Router,
    routing::{delete, get},
};

use crate::api::handlers::{admin::delete_user, health::health, users::me};

pub fn routes() -> Router {
    Router::new()
        .route("/api/public/health", get(health))
        .route("/api/users/me", get(me))
        .route("/api/admin/users/{user_id}", delete(delete_user))
}
