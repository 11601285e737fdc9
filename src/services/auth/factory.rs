/// Factory: build the token verifier from application `AuthConfig`.
use std::sync::Arc;

use crate::config::{AuthConfig, ConfigError};
use crate::services::auth::{JwtVerifier, TokenVerifier};

pub fn build_token_verifier(config: &AuthConfig) -> Result<Arc<dyn TokenVerifier>, ConfigError> {
    let verifier = JwtVerifier::new(
        &config.key,
        config.issuer.as_deref(),
        config.audience.as_deref(),
        config.leeway_seconds,
        config.authorities_claim.clone(),
    )?;

    Ok(Arc::new(verifier))
}
