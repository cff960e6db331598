//! Anonymous session header extractor.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the anonymous session token, in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

/// The raw `X-Session-ID` header, trimmed.
///
/// A missing or blank header yields `None`. The value is not validated here:
/// a bearer token outranks the session, so a malformed header only matters
/// for anonymous requests and is rejected during identity resolution.
#[derive(Debug, Clone)]
pub struct SessionHeader(pub Option<String>);

impl SessionHeader {
    /// The header value, if one was sent.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for SessionHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(SESSION_HEADER).and_then(|value| {
            // Non-UTF-8 bytes become replacement characters, which never parse.
            let value = String::from_utf8_lossy(value.as_bytes());
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        });
        Ok(Self(value))
    }
}
