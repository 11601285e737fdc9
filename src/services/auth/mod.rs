pub mod access_jwt;
pub mod factory;
pub mod verifier;

pub use access_jwt::{JwtVerifier, VerificationKey};
pub use factory::build_token_verifier;
pub use verifier::{TokenVerifier, VerificationError};
