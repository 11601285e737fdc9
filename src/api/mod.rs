/*
 * Responsibility
 * - security chain の背後にある業務 endpoint (demo 用)
 * - routes() の re-export
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
