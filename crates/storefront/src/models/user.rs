//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartwheel_core::{UserId, Username};

/// A storefront user, safe to return to clients (no password hash).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The stored credentials for a login attempt.
///
/// Kept separate from [`User`] so the hash never ends up in a response body.
#[derive(Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("id", &self.id)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_has_no_password() {
        let user = User {
            id: UserId::new(5),
            username: Username::parse("dana").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["username"], "dana");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_hash() {
        let creds = UserCredentials {
            id: UserId::new(1),
            password_hash: "$argon2id$v=19$secret".to_owned(),
        };
        assert!(!format!("{creds:?}").contains("argon2id"));
    }
}
