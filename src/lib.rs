/*
 * Responsibility
 * - ライブラリとしての公開面: bearer token を検証して認可判断を下す pipeline
 * - 組み立ては security::chain、個々の stage は middleware 配下
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod security;
pub mod services;

pub use security::{Principal, SecurityChain};
