//! Authentication and authorization stages of the security chain.
//!
//! - `token`: bearer token → `Principal` in request extensions (never responds)
//! - `authorize`: public paths / principal / authorities → forward, 401 or 403
pub mod authorize;
pub mod token;
