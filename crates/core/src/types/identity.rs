//! Caller identity for cart ownership.
//!
//! A cart belongs to exactly one owner: either a registered user or an
//! anonymous session. [`Identity`] captures that choice, and
//! [`Identity::owner_key`] turns it into the single string the database uses
//! to guarantee at most one active cart per owner.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Errors that can occur when parsing a [`SessionToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("session id cannot be empty")]
    Empty,
    #[error("session id must be at most {max} characters")]
    TooLong { max: usize },
    #[error("session id may only contain visible ASCII characters")]
    InvalidCharacter,
}

/// Opaque identifier for an anonymous shopper.
///
/// Tokens arrive in the `X-Session-ID` header. Minted tokens look like
/// `sess_` followed by 32 lowercase hex digits, but any visible ASCII string
/// up to 128 characters is accepted so clients may bring their own.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Maximum accepted token length.
    pub const MAX_LENGTH: usize = 128;

    const PREFIX: &'static str = "sess_";

    /// Parse a client-supplied token. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is blank, longer than
    /// [`Self::MAX_LENGTH`] or contains anything other than visible ASCII.
    pub fn parse(s: &str) -> Result<Self, SessionTokenError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SessionTokenError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SessionTokenError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_graphic()) {
            return Err(SessionTokenError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Build a token from 128 bits of caller-provided randomness.
    #[must_use]
    pub fn from_entropy(bytes: [u8; 16]) -> Self {
        use fmt::Write;

        let mut token = String::with_capacity(Self::PREFIX.len() + 32);
        token.push_str(Self::PREFIX);
        for byte in bytes {
            // Writing to a String cannot fail.
            let _ = write!(token, "{byte:02x}");
        }
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens act as bearer credentials for anonymous carts; keep them out of logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionToken {
    type Err = SessionTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = SessionTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

/// Who is making a cart request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// A logged-in user.
    Authenticated(UserId),
    /// An anonymous shopper identified by a session token.
    Anonymous(SessionToken),
}

impl Identity {
    /// The cart ownership key for this identity.
    ///
    /// User and session keys live in disjoint namespaces, so a session token
    /// that happens to look like a number never collides with a user.
    #[must_use]
    pub fn owner_key(&self) -> String {
        match self {
            Self::Authenticated(user_id) => format!("user:{user_id}"),
            Self::Anonymous(token) => format!("session:{}", token.as_str()),
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Authenticated(user_id) => Some(*user_id),
            Self::Anonymous(_) => None,
        }
    }

    #[must_use]
    pub const fn session_token(&self) -> Option<&SessionToken> {
        match self {
            Self::Authenticated(_) => None,
            Self::Anonymous(token) => Some(token),
        }
    }
}
