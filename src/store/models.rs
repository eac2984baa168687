use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered user. Never modified after creation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserIdentity {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserIdentity")
            .field("email", &"[REDACTED]")
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_email_and_hash() {
        let user = UserIdentity::new("a@b.com".into(), "$2b$04$secret".into());
        let out = format!("{:?}", user);
        assert!(!out.contains("a@b.com"));
        assert!(!out.contains("secret"));
    }
}
