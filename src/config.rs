/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, Auth 設定, public paths, CORS 許可など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::middleware::cors::CorsPolicy;
use crate::middleware::http::HttpSettings;
use crate::security::matcher::RequestMatchers;
use crate::security::policy::AuthorityRule;
use crate::services::auth::VerificationKey;

const DEFAULT_PUBLIC_PATHS: &str = "* /api/public/**";
const DEFAULT_AUTHORITY_RULES: &str = "* /api/admin/**=ROLE_ADMIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    Pattern { pattern: String, reason: String },
}

impl ConfigError {
    pub fn pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::Pattern { pattern, reason } => {
                write!(f, "invalid pattern '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings consumed by the token verifier.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
    pub key: VerificationKey,
    pub authorities_claim: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub auth: AuthConfig,
    pub cors: CorsPolicy,
    pub public_paths: RequestMatchers,
    pub authority_rules: Vec<AuthorityRule>,
    pub http: HttpSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let auth = AuthConfig {
            issuer: non_empty(lookup("AUTH_ISSUER")),
            audience: non_empty(lookup("AUTH_AUDIENCE")),
            leeway_seconds: parse_or(&lookup, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?,
            key: verification_key(&lookup)?,
            authorities_claim: non_empty(lookup("AUTHORITIES_CLAIM"))
                .unwrap_or_else(|| "roles".to_string()),
        };

        let (allowed_origins, allowed_origin_patterns) = origin_lists(
            lookup("CORS_ALLOWED_ORIGINS"),
            lookup("CORS_ALLOWED_ORIGIN_PATTERNS"),
        );

        let cors = CorsPolicy {
            allowed_origins,
            allowed_methods: list_or_wildcard(lookup("CORS_ALLOWED_METHODS")),
            allowed_headers: list_or_wildcard(lookup("CORS_ALLOWED_HEADERS")),
            allowed_origin_patterns,
            max_age: Some(Duration::from_secs(parse_or(
                &lookup,
                "CORS_MAX_AGE_SECONDS",
                600,
            )?)),
        };

        let public_paths = RequestMatchers::parse_list(
            &lookup("PUBLIC_PATHS").unwrap_or_else(|| DEFAULT_PUBLIC_PATHS.to_string()),
        )?;

        let authority_rules = AuthorityRule::parse_list(
            &lookup("AUTHORITY_RULES").unwrap_or_else(|| DEFAULT_AUTHORITY_RULES.to_string()),
        )?;

        let defaults = HttpSettings::default();
        let http = HttpSettings {
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout.as_secs(),
            )?),
            body_limit_bytes: parse_or(
                &lookup,
                "REQUEST_BODY_LIMIT_BYTES",
                defaults.body_limit_bytes,
            )?,
        };

        Ok(Self {
            addr,
            app_env,
            auth,
            cors,
            public_paths,
            authority_rules,
            http,
        })
    }
}

fn verification_key<F>(lookup: &F) -> Result<VerificationKey, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = non_empty(lookup("ACCESS_JWT_SECRET"));
    let pem = non_empty(lookup("ACCESS_JWT_PUBLIC_KEY_PEM")).map(|pem| pem.replace("\\n", "\n"));

    match (secret, pem) {
        (Some(secret), None) => Ok(VerificationKey::Secret(secret)),
        (None, Some(pem)) => Ok(VerificationKey::Ed25519PublicPem(pem)),
        (Some(_), Some(_)) => Err(ConfigError::Invalid(
            "ACCESS_JWT_SECRET and ACCESS_JWT_PUBLIC_KEY_PEM are mutually exclusive",
        )),
        (None, None) => Err(ConfigError::Missing(
            "ACCESS_JWT_SECRET or ACCESS_JWT_PUBLIC_KEY_PEM",
        )),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Unset means the permissive default (`*`); an explicitly empty value allows nothing.
fn list_or_wildcard(value: Option<String>) -> Vec<String> {
    match value {
        Some(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec!["*".to_string()],
    }
}

// Exact origins and origin patterns form one allowlist. Once either is set, the
// other no longer falls back to `*`, otherwise the default pattern would allow
// every origin again.
fn origin_lists(origins: Option<String>, patterns: Option<String>) -> (Vec<String>, Vec<String>) {
    if origins.is_none() && patterns.is_none() {
        return (list_or_wildcard(None), list_or_wildcard(None));
    }

    (
        list_or_wildcard(Some(origins.unwrap_or_default())),
        list_or_wildcard(Some(patterns.unwrap_or_default())),
    )
}
