use serde::Serialize;

use crate::security::Principal;

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub subject: String,
    pub authorities: Vec<String>,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            subject: principal.subject().to_string(),
            authorities: principal.authorities().map(str::to_string).collect(),
        }
    }
}
