//! Stateless bearer tokens (HS256 JWT).
//!
//! Tokens carry only the user ID and an expiry. Nothing is stored server-side,
//! so a token stays valid until it expires.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use cartwheel_core::UserId;

use super::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: i32,
    exp: u64,
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    /// Create a token service signing with `secret`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Issue a token for `user_id` that expires after the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let exp = jsonwebtoken::get_current_timestamp().saturating_add(self.ttl.as_secs());
        self.issue_with_expiry(user_id, exp)
    }

    fn issue_with_expiry(&self, user_id: UserId, exp: u64) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: user_id.as_i32(),
            exp,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| {
                tracing::error!(error = %e, "failed to sign token");
                AuthError::TokenIssue
            },
        )
    }

    /// Verify a token and return the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExpiredToken` for expired tokens,
    /// `AuthError::MalformedToken` for input that is not a JWT at all and
    /// `AuthError::InvalidToken` for anything that fails verification.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                    AuthError::ExpiredToken
                }
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthError::MalformedToken,
                _ => AuthError::InvalidToken,
            })?;

        Ok(UserId::new(data.claims.user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret), Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service("kX9#mQ2$vL7!pR4@wT6^zB1&nF8*hJ3%");
        let token = tokens.issue(UserId::new(42)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_expired_token() {
        let tokens = service("kX9#mQ2$vL7!pR4@wT6^zB1&nF8*hJ3%");
        let past = jsonwebtoken::get_current_timestamp() - 3600;
        let token = tokens.issue_with_expiry(UserId::new(1), past).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer = service("kX9#mQ2$vL7!pR4@wT6^zB1&nF8*hJ3%");
        let verifier = service("Zq8!rW3@tY6#uI1$oP4%aS7^dF0&gH2*");
        let token = issuer.issue(UserId::new(1)).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service("kX9#mQ2$vL7!pR4@wT6^zB1&nF8*hJ3%");
        assert!(matches!(
            tokens.verify("not-a-jwt"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn test_debug_hides_keys() {
        let tokens = service("kX9#mQ2$vL7!pR4@wT6^zB1&nF8*hJ3%");
        assert!(!format!("{tokens:?}").contains("kX9#"));
    }
}
