//! Request matchers: (method, path pattern) pairs evaluated against a request.
//!
//! Pattern syntax:
//! - `/` separated segments, always starting with `/`
//! - a literal segment matches itself exactly (case-sensitive)
//! - `*` or `{name}` matches exactly one non-empty segment
//! - `**` matches zero or more remaining segments and is only allowed last
//!
//! There is no implicit prefix matching: `/api/public` does not cover
//! `/api/public/health`, `/api/public/**` does.
//!
//! A `GET` method also covers `HEAD`, since the router answers `HEAD` with the
//! `GET` handler.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    Any,
    Exact(Method),
}

impl MethodMatcher {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::Exact(expected) => {
                expected == method || (*expected == Method::GET && *method == Method::HEAD)
            }
        }
    }
}

impl FromStr for MethodMatcher {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "*" {
            return Ok(MethodMatcher::Any);
        }

        Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
            .map(MethodMatcher::Exact)
            .map_err(|_| ConfigError::pattern(raw, "invalid HTTP method"))
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodMatcher::Any => f.write_str("*"),
            MethodMatcher::Exact(method) => f.write_str(method.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Single,
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };

        let segments: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        for (i, expected) in self.segments.iter().enumerate() {
            match expected {
                Segment::Rest => return true,
                Segment::Single => match segments.get(i) {
                    Some(actual) if !actual.is_empty() => {}
                    _ => return false,
                },
                Segment::Literal(literal) => {
                    if segments.get(i) != Some(&literal.as_str()) {
                        return false;
                    }
                }
            }
        }

        segments.len() == self.segments.len()
    }
}

impl FromStr for PathPattern {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let Some(body) = raw.strip_prefix('/') else {
            return Err(ConfigError::pattern(raw, "must start with '/'"));
        };

        let mut segments = Vec::new();
        if !body.is_empty() {
            let parts: Vec<&str> = body.split('/').collect();
            let last = parts.len() - 1;

            for (i, part) in parts.into_iter().enumerate() {
                let segment = match part {
                    "" => return Err(ConfigError::pattern(raw, "empty path segment")),
                    "**" if i != last => {
                        return Err(ConfigError::pattern(
                            raw,
                            "'**' is only allowed as the last segment",
                        ));
                    }
                    "**" => Segment::Rest,
                    "*" => Segment::Single,
                    _ if is_variable(part) => Segment::Single,
                    _ if part.contains(['*', '{', '}']) => {
                        return Err(ConfigError::pattern(
                            raw,
                            "wildcards must span a whole segment",
                        ));
                    }
                    _ => Segment::Literal(part.to_string()),
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

fn is_variable(segment: &str) -> bool {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .is_some_and(|name| !name.is_empty() && !name.contains(['{', '}', '*']))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMatcher {
    method: MethodMatcher,
    pattern: PathPattern,
}

impl RequestMatcher {
    pub fn new(method: MethodMatcher, pattern: PathPattern) -> Self {
        Self { method, pattern }
    }

    pub fn method(&self) -> &MethodMatcher {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.matches(method) && self.pattern.matches(path)
    }
}

/// `"GET /api/public/health"`, `"* /api/public/**"` or a bare `"/api/public/**"` (any method).
impl FromStr for RequestMatcher {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split_whitespace().collect();

        match parts.as_slice() {
            [pattern] => Ok(Self::new(MethodMatcher::Any, pattern.parse()?)),
            [method, pattern] => Ok(Self::new(method.parse()?, pattern.parse()?)),
            _ => Err(ConfigError::pattern(raw, "expected '[METHOD] /path'")),
        }
    }
}

impl fmt::Display for RequestMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern.as_str())
    }
}

/// Ordered set of request matchers. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMatchers(Vec<RequestMatcher>);

impl RequestMatchers {
    pub fn new(matchers: Vec<RequestMatcher>) -> Self {
        Self(matchers)
    }

    /// Parse a comma separated list of matcher declarations.
    pub fn parse_list(raw: &str) -> Result<Self, ConfigError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<RequestMatcher>)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.0.iter().any(|m| m.matches(method, path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestMatcher> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(raw: &str) -> PathPattern {
        raw.parse().unwrap()
    }

    #[test]
    fn literal_pattern_matches_exactly() {
        let p = pattern("/api/public/health");
        assert!(p.matches("/api/public/health"));
        assert!(!p.matches("/api/public/health/"));
        assert!(!p.matches("/api/public/healthz"));
        assert!(!p.matches("/api/public"));
        assert!(!p.matches("/API/public/health"));
    }

    #[test]
    fn no_implicit_prefix_match() {
        let p = pattern("/api/public");
        assert!(p.matches("/api/public"));
        assert!(!p.matches("/api/public/health"));
    }

    #[test]
    fn single_wildcards_cover_one_segment() {
        let p = pattern("/api/users/{id}/posts/*");
        assert!(p.matches("/api/users/5/posts/7"));
        assert!(!p.matches("/api/users/5/posts"));
        assert!(!p.matches("/api/users//posts/7"));
        assert!(!p.matches("/api/users/5/posts/7/comments"));
    }

    #[test]
    fn trailing_double_wildcard_covers_rest() {
        let p = pattern("/api/public/**");
        assert!(p.matches("/api/public"));
        assert!(p.matches("/api/public/health"));
        assert!(p.matches("/api/public/a/b/c"));
        assert!(!p.matches("/api/publicity"));
        assert!(!p.matches("/api/private/health"));
    }

    #[test]
    fn root_patterns() {
        assert!(pattern("/").matches("/"));
        assert!(!pattern("/").matches("/x"));
        assert!(pattern("/**").matches("/"));
        assert!(pattern("/**").matches("/anything/at/all"));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for raw in ["", "api", "/api//x", "/api/**/x", "/api/user*", "/api/{}", "/api/{id"] {
            let err = raw.parse::<PathPattern>().unwrap_err();
            assert!(matches!(err, ConfigError::Pattern { .. }), "{raw}");
        }
    }

    #[test]
    fn request_matcher_checks_method_and_path() {
        let m: RequestMatcher = "get /api/public/health".parse().unwrap();
        assert!(m.matches(&Method::GET, "/api/public/health"));
        assert!(!m.matches(&Method::POST, "/api/public/health"));
        assert_eq!(m.to_string(), "GET /api/public/health");

        let any: RequestMatcher = "/auth/login".parse().unwrap();
        assert!(any.matches(&Method::POST, "/auth/login"));
        assert_eq!(any.method(), &MethodMatcher::Any);
    }

    #[test]
    fn get_covers_head_but_not_the_reverse() {
        let get: MethodMatcher = "GET".parse().unwrap();
        assert!(get.matches(&Method::HEAD));
        assert!(!get.matches(&Method::POST));

        let head: MethodMatcher = "HEAD".parse().unwrap();
        assert!(!head.matches(&Method::GET));
    }

    #[test]
    fn request_matcher_rejects_extra_tokens() {
        assert!("GET /a /b".parse::<RequestMatcher>().is_err());
        assert!("G@T /a".parse::<RequestMatcher>().is_err());
    }

    #[test]
    fn parse_list_skips_blank_entries() {
        let set = RequestMatchers::parse_list("GET /api/public/**, ,POST /auth/login,").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.matches(&Method::POST, "/auth/login"));
        assert!(!set.matches(&Method::GET, "/auth/login"));
        assert!(RequestMatchers::parse_list("").unwrap().is_empty());
    }
}
