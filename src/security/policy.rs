//! Authorization decision: public paths first, then "authenticated", then authorities.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::config::ConfigError;
use crate::security::matcher::{RequestMatcher, RequestMatchers};
use crate::security::principal::Principal;

/// Terminal outcome of the authorization decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Unauthenticated,
    Unauthorized,
}

/// `"* /api/admin/**=ROLE_ADMIN"`: requests matching the left side need the authority on the right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityRule {
    matcher: RequestMatcher,
    authority: String,
}

impl AuthorityRule {
    pub fn new(matcher: RequestMatcher, authority: impl Into<String>) -> Self {
        Self {
            matcher,
            authority: authority.into(),
        }
    }

    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ConfigError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<AuthorityRule>)
            .collect()
    }

    pub fn matcher(&self) -> &RequestMatcher {
        &self.matcher
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl FromStr for AuthorityRule {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (matcher, authority) = raw
            .rsplit_once('=')
            .ok_or_else(|| ConfigError::pattern(raw, "expected '[METHOD] /path=AUTHORITY'"))?;

        let authority = authority.trim();
        if authority.is_empty() {
            return Err(ConfigError::pattern(raw, "empty authority"));
        }

        Ok(Self::new(matcher.trim().parse()?, authority))
    }
}

impl fmt::Display for AuthorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.matcher, self.authority)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    public_paths: RequestMatchers,
    authority_rules: Vec<AuthorityRule>,
}

impl AccessPolicy {
    pub fn new(public_paths: RequestMatchers, authority_rules: Vec<AuthorityRule>) -> Self {
        Self {
            public_paths,
            authority_rules,
        }
    }

    pub fn public_paths(&self) -> &RequestMatchers {
        &self.public_paths
    }

    pub fn authority_rules(&self) -> &[AuthorityRule] {
        &self.authority_rules
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.public_paths.matches(method, path)
    }

    /// Authority demanded by the first matching rule, if any.
    pub fn required_authority(&self, method: &Method, path: &str) -> Option<&str> {
        self.authority_rules
            .iter()
            .find(|rule| rule.matcher.matches(method, path))
            .map(AuthorityRule::authority)
    }

    pub fn decide(&self, method: &Method, path: &str, principal: Option<&Principal>) -> Decision {
        if self.is_public(method, path) {
            return Decision::Allowed;
        }

        let Some(principal) = principal else {
            return Decision::Unauthenticated;
        };

        match self.required_authority(method, path) {
            Some(authority) if !principal.has_authority(authority) => Decision::Unauthorized,
            _ => Decision::Allowed,
        }
    }
}
