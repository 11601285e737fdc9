use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ConfigError;
use crate::security::Principal;
use crate::services::auth::verifier::{TokenVerifier, VerificationError};

/// Key material for access-token signature checks.
#[derive(Clone)]
pub enum VerificationKey {
    /// HS256 shared secret.
    Secret(String),
    /// EdDSA (Ed25519) public key, SPKI PEM.
    Ed25519PublicPem(String),
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            Self::Secret(_) => f.write_str("Secret(..)"),
            Self::Ed25519PublicPem(_) => f.write_str("Ed25519PublicPem(..)"),
        }
    }
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - `iss`/`aud`/`exp`/`nbf` are checked by `jsonwebtoken::Validation`.
/// - The authorities claim name is configurable, so it is read from `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub jti: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// JWT access-token verifier (HS256 or EdDSA).
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    authorities_claim: String,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .field("authorities_claim", &self.authorities_claim)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(
        key: &VerificationKey,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
        authorities_claim: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (decoding_key, algorithm) = match key {
            VerificationKey::Secret(secret) => {
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            VerificationKey::Ed25519PublicPem(pem) => {
                let key = DecodingKey::from_ed_pem(pem.as_bytes()).map_err(|e| {
                    tracing::warn!(error = %e, "failed to parse access JWT public key PEM (expected Ed25519 SPKI PEM)");
                    ConfigError::Invalid("ACCESS_JWT_PUBLIC_KEY_PEM")
                })?;
                (key, Algorithm::EdDSA)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = leeway_seconds;

        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
            authorities_claim: authorities_claim.into(),
        })
    }

    /// Verify signature + registered claims and decode the payload.
    pub fn decode_claims(&self, token: &str) -> Result<AccessTokenClaims, VerificationError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    // `roles: ["A", "B"]` or OAuth-style `scope: "a b"`; absent means no authorities.
    fn authorities(&self, claims: &AccessTokenClaims) -> Result<Vec<String>, VerificationError> {
        match claims.extra.get(&self.authorities_claim) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(s.split_whitespace().map(str::to_string).collect()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or(VerificationError::InvalidAuthorities)
                })
                .collect(),
            Some(_) => Err(VerificationError::InvalidAuthorities),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Principal, VerificationError> {
        let claims = self.decode_claims(token)?;

        if claims.sub.trim().is_empty() {
            return Err(VerificationError::EmptyClaim("sub"));
        }

        let authorities = self.authorities(&claims)?;
        let principal = Principal::new(claims.sub).with_authorities(authorities);

        Ok(match claims.jti {
            Some(jti) => principal.with_token_id(jti),
            None => principal,
        })
    }
}
