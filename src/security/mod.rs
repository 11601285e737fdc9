/*
 * Responsibility
 * - 認証/認可 pipeline の型と判断ロジック
 * - HTTP 層への配線は middleware 配下、組み立ては chain
 */
pub mod chain;
pub mod handlers;
pub mod matcher;
pub mod policy;
mod principal;

pub use chain::{CsrfProtection, SecurityChain, SecurityChainBuilder, SessionPolicy, Stage};
pub use handlers::{
    AccessDeniedHandler, AuthenticationEntryPoint, JsonAccessDeniedHandler,
    JsonAuthenticationEntryPoint,
};
pub use matcher::{MethodMatcher, PathPattern, RequestMatcher, RequestMatchers};
pub use policy::{AccessPolicy, AuthorityRule, Decision};
pub use principal::Principal;
