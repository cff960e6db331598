//! Bearer token extractors.
//!
//! Tokens are read from `Authorization: Bearer <token>` and verified with the
//! [`TokenService`](crate::services::TokenService) held in the app state.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use cartwheel_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::services::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user_id): RequireAuth) -> String {
///     format!("Hello, user {user_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub UserId);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.ok_or(AuthError::MissingToken)?;
        let user_id = state.tokens().verify(token)?;
        set_sentry_user(&user_id);
        Ok(Self(user_id))
    }
}

/// Extractor that reads a bearer token if one is sent.
///
/// A request without an `Authorization` header is anonymous. A request with
/// a header that fails verification is rejected rather than silently
/// downgraded, so a client with an expired token finds out.
#[derive(Debug, Clone, Copy)]
pub struct OptionalAuth(pub Option<UserId>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers)? else {
            return Ok(Self(None));
        };
        let user_id = state.tokens().verify(token)?;
        set_sentry_user(&user_id);
        Ok(Self(Some(user_id)))
    }
}

/// Pull the token out of an `Authorization: Bearer` header.
///
/// Returns `Ok(None)` when there is no header at all.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidAuthScheme)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    Ok(Some(token))
}
