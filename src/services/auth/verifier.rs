//! Token verification collaborator used by the token authentication stage.

use thiserror::Error;

use crate::security::Principal;

/// Why a token was rejected. Only ever logged; the caller sees a generic 401.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),

    #[error("authorities claim must be a string or an array of strings")]
    InvalidAuthorities,
}

/// `verify(token) -> Principal | VerificationFailure`.
///
/// Implementations must be a pure function of the token and their key
/// material: the same verifier is shared by every in-flight request.
pub trait TokenVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> Result<Principal, VerificationError>;
}
