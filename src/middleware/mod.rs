/*
 * Responsibility
 * - middleware の公開インターフェース
 * - cors / auth stage は security::chain から、http は app から適用する
 */
pub mod auth;
pub mod cors;
pub mod http;
