use std::collections::BTreeSet;

/// 検証済み token から得た認証主体
///
/// - `subject` は token の `sub`
/// - `authorities` は coarse-grained な権限 (roles/scopes)
/// - `token_id` は監査/ログ相関用 (`jti`)
///
/// Token Authentication Stage が request extensions に一度だけ入れる。
/// 以降は読み取り専用で、setter は持たない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
    authorities: BTreeSet<String>,
    token_id: Option<String>,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            authorities: BTreeSet::new(),
            token_id: None,
        }
    }

    pub fn with_authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorities
            .extend(authorities.into_iter().map(Into::into));
        self
    }

    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Authorities in sorted order.
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.authorities.iter().map(String::as_str)
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    pub fn token_id(&self) -> Option<&str> {
        self.token_id.as_deref()
    }
}
