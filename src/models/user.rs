use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub google_id: Option<String>,
}

/// Per-request view of who is calling.
///
/// Built by the auth middleware and handed to handlers through request
/// extensions. The bearer is the backend credential, never the session token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    username: Option<String>,
    bearer: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(username: impl Into<String>, bearer: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            bearer: Some(bearer.into()),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.bearer.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }
}
