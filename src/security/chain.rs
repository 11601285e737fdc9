//! Security chain assembly.
//!
//! The chain is an explicit, ordered list of stages. It is built once at startup from
//! static configuration plus three collaborators passed in by the caller (token verifier,
//! 401 entry point, 403 handler), then handed to the router. After `build()` nothing in
//! it changes; all state is behind `Arc` and shared by concurrent requests.
//!
//! ```ignore
//! let chain = SecurityChain::builder(verifier, entry_point, access_denied)
//!     .public_paths(config.public_paths.clone())
//!     .authority_rules(config.authority_rules.clone())
//!     .cors(config.cors.clone())
//!     .build()?;
//! let app = chain.apply(api::routes());
//! ```

use std::fmt;
use std::sync::Arc;

use axum::Router;

use crate::config::ConfigError;
use crate::middleware::auth::authorize::{self, AuthorizationStage};
use crate::middleware::auth::token;
use crate::middleware::cors::{self, CorsPolicy, CorsStage};
use crate::security::handlers::{AccessDeniedHandler, AuthenticationEntryPoint};
use crate::security::matcher::RequestMatchers;
use crate::security::policy::{AccessPolicy, AuthorityRule};
use crate::services::auth::TokenVerifier;

/// One step of the chain, in the order a request passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Preflight answers and CORS response headers.
    Cors,
    /// Cross-site request forgery protection (disabled: no cookies are consulted).
    Csrf,
    /// Session policy (stateless: nothing created, nothing looked up).
    Session,
    /// Bearer token → principal. Runs before any credential-form authentication would.
    TokenAuthentication,
    /// Public paths / principal / authorities → forward, 401 or 403.
    Authorization,
}

/// Request order. `apply` layers them in reverse so the first entry is outermost.
pub const STAGES: [Stage; 5] = [
    Stage::Cors,
    Stage::Csrf,
    Stage::Session,
    Stage::TokenAuthentication,
    Stage::Authorization,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsrfProtection {
    #[default]
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    #[default]
    Stateless,
    IfRequired,
}

#[derive(Clone)]
pub struct SecurityChain {
    inner: Arc<Inner>,
}

struct Inner {
    cors: CorsStage,
    csrf: CsrfProtection,
    session: SessionPolicy,
    verifier: Arc<dyn TokenVerifier>,
    authorization: AuthorizationStage,
}

impl fmt::Debug for SecurityChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityChain")
            .field("stages", &STAGES)
            .field("csrf", &self.inner.csrf)
            .field("session", &self.inner.session)
            .field("policy", self.inner.authorization.policy())
            .finish()
    }
}

impl SecurityChain {
    pub fn builder(
        verifier: Arc<dyn TokenVerifier>,
        entry_point: Arc<dyn AuthenticationEntryPoint>,
        access_denied: Arc<dyn AccessDeniedHandler>,
    ) -> SecurityChainBuilder {
        SecurityChainBuilder {
            verifier,
            entry_point,
            access_denied,
            cors: CorsPolicy::default(),
            public_paths: RequestMatchers::default(),
            authority_rules: Vec::new(),
            csrf: CsrfProtection::default(),
            session: SessionPolicy::default(),
        }
    }

    pub fn stages(&self) -> &'static [Stage] {
        &STAGES
    }

    pub fn csrf(&self) -> CsrfProtection {
        self.inner.csrf
    }

    pub fn session_policy(&self) -> SessionPolicy {
        self.inner.session
    }

    pub fn policy(&self) -> &AccessPolicy {
        self.inner.authorization.policy()
    }

    /// Wrap every route (and the fallback) of `router` in the chain.
    pub fn apply(&self, router: Router) -> Router {
        STAGES
            .iter()
            .rev()
            .fold(router, |router, stage| match stage {
                Stage::Authorization => authorize::apply(router, self.inner.authorization.clone()),
                Stage::TokenAuthentication => token::apply(router, self.inner.verifier.clone()),
                // no layer: no session is created or consulted, no CSRF token is checked
                Stage::Session | Stage::Csrf => router,
                Stage::Cors => cors::apply(router, &self.inner.cors),
            })
    }
}

pub struct SecurityChainBuilder {
    verifier: Arc<dyn TokenVerifier>,
    entry_point: Arc<dyn AuthenticationEntryPoint>,
    access_denied: Arc<dyn AccessDeniedHandler>,
    cors: CorsPolicy,
    public_paths: RequestMatchers,
    authority_rules: Vec<AuthorityRule>,
    csrf: CsrfProtection,
    session: SessionPolicy,
}

impl SecurityChainBuilder {
    pub fn cors(mut self, policy: CorsPolicy) -> Self {
        self.cors = policy;
        self
    }

    pub fn public_paths(mut self, public_paths: RequestMatchers) -> Self {
        self.public_paths = public_paths;
        self
    }

    pub fn authority_rules(mut self, rules: Vec<AuthorityRule>) -> Self {
        self.authority_rules = rules;
        self
    }

    pub fn csrf(mut self, csrf: CsrfProtection) -> Self {
        self.csrf = csrf;
        self
    }

    pub fn session_policy(mut self, session: SessionPolicy) -> Self {
        self.session = session;
        self
    }

    /// Validate and freeze the chain. Any error here must stop the process from serving.
    pub fn build(self) -> Result<SecurityChain, ConfigError> {
        // Token-only authentication: there is no session store to back a stateful policy,
        // and no session cookie for CSRF protection to guard.
        if self.session != SessionPolicy::Stateless {
            return Err(ConfigError::Invalid("session policy must be stateless"));
        }
        if self.csrf != CsrfProtection::Disabled {
            return Err(ConfigError::Invalid(
                "csrf protection requires a cookie session",
            ));
        }

        let cors = self.cors.compile()?;
        let policy = AccessPolicy::new(self.public_paths, self.authority_rules);

        tracing::info!(
            public_paths = %join(policy.public_paths().iter()),
            authority_rules = %join(policy.authority_rules().iter()),
            any_origin = self.cors.allows_any_origin(),
            "security chain assembled"
        );

        let authorization =
            AuthorizationStage::new(Arc::new(policy), self.entry_point, self.access_denied);

        Ok(SecurityChain {
            inner: Arc::new(Inner {
                cors,
                csrf: self.csrf,
                session: self.session,
                verifier: self.verifier,
                authorization,
            }),
        })
    }
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}
