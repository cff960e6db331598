//! Shopper identity resolution.
//!
//! A request can carry a verified bearer token, an `X-Session-ID` header,
//! both, or neither. This module turns those signals into exactly one
//! [`Identity`].

use thiserror::Error;

use cartwheel_core::{Identity, SessionToken, SessionTokenError, UserId};

/// Errors from identity resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Neither a user nor a session was presented, and minting was not allowed.
    #[error("authentication or session id required")]
    NoIdentity,

    /// The request is anonymous and its session header is not a valid token.
    #[error("invalid X-Session-ID header: {0}")]
    InvalidSession(#[from] SessionTokenError),
}

/// Whether to mint a session token for a request that has no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintPolicy {
    /// Create a new anonymous session (write paths such as add-to-cart).
    Mint,
    /// Never mint; a request without identity is an error (read paths).
    Never,
}

/// The resolved identity plus the token to echo back, if one was minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    /// Set only when a new session token was created for this request.
    pub minted: Option<SessionToken>,
}

/// Resolve the identity of a request.
///
/// An authenticated user always wins over a session token, and the raw
/// session header is only parsed when there is no user. Without either, a
/// fresh session token is minted when `policy` allows it.
///
/// # Errors
///
/// Returns `IdentityError::InvalidSession` for an anonymous request with a
/// malformed session header, and `IdentityError::NoIdentity` if there is
/// nothing to resolve and `policy` is [`MintPolicy::Never`].
pub fn resolve(
    user: Option<UserId>,
    session: Option<&str>,
    policy: MintPolicy,
) -> Result<ResolvedIdentity, IdentityError> {
    if let Some(user_id) = user {
        return Ok(ResolvedIdentity {
            identity: Identity::Authenticated(user_id),
            minted: None,
        });
    }

    if let Some(raw) = session {
        let token = SessionToken::parse(raw)?;
        return Ok(ResolvedIdentity {
            identity: Identity::Anonymous(token),
            minted: None,
        });
    }

    match policy {
        MintPolicy::Mint => {
            let token = mint_session_token();
            tracing::debug!("minted anonymous session");
            Ok(ResolvedIdentity {
                identity: Identity::Anonymous(token.clone()),
                minted: Some(token),
            })
        }
        MintPolicy::Never => Err(IdentityError::NoIdentity),
    }
}

/// Create a new session token from 128 bits of OS-seeded CSPRNG output.
#[must_use]
pub fn mint_session_token() -> SessionToken {
    SessionToken::from_entropy(rand::random::<[u8; 16]>())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token(s: &str) -> SessionToken {
        SessionToken::parse(s).unwrap()
    }

    fn overlong() -> String {
        "x".repeat(SessionToken::MAX_LENGTH + 172)
    }

    #[test]
    fn test_authenticated_wins_over_session() {
        let resolved = resolve(
            Some(UserId::new(7)),
            Some("sess_abc"),
            MintPolicy::Mint,
        )
        .unwrap();
        assert_eq!(resolved.identity, Identity::Authenticated(UserId::new(7)));
        assert!(resolved.minted.is_none());
    }

    #[test]
    fn test_session_used_when_not_authenticated() {
        let resolved = resolve(None, Some("sess_abc"), MintPolicy::Never).unwrap();
        assert_eq!(resolved.identity, Identity::Anonymous(token("sess_abc")));
        assert!(resolved.minted.is_none());
    }

    #[test]
    fn test_mints_when_allowed() {
        let resolved = resolve(None, None, MintPolicy::Mint).unwrap();
        let minted = resolved.minted.unwrap();
        assert_eq!(resolved.identity, Identity::Anonymous(minted.clone()));
        assert!(minted.as_str().starts_with("sess_"));
    }

    #[test]
    fn test_no_identity_when_minting_disallowed() {
        assert_eq!(
            resolve(None, None, MintPolicy::Never),
            Err(IdentityError::NoIdentity)
        );
    }

    #[test]
    fn test_malformed_session_ignored_for_user() {
        let session = overlong();
        let resolved = resolve(Some(UserId::new(7)), Some(&session), MintPolicy::Never).unwrap();
        assert_eq!(resolved.identity, Identity::Authenticated(UserId::new(7)));
    }

    #[test]
    fn test_malformed_session_rejected_when_anonymous() {
        assert!(matches!(
            resolve(None, Some(&overlong()), MintPolicy::Mint),
            Err(IdentityError::InvalidSession(SessionTokenError::TooLong { .. }))
        ));
    }

    #[test]
    fn test_minted_tokens_differ() {
        assert_ne!(mint_session_token(), mint_session_token());
    }
}
