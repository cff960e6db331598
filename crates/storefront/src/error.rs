//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error renders as JSON:
//!
//! ```json
//! { "error": "item 7 not found", "code": "item_not_found" }
//! ```
//!
//! Server errors add a `details` field with the underlying store error.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CatalogError, IdentityError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The request carried no usable identity.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Cart or order rule violated.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidUsername(_)
                | AuthError::WeakPassword(_)
                | AuthError::UserAlreadyExists => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidAuthScheme
                | AuthError::MalformedToken
                | AuthError::ExpiredToken
                | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::TokenIssue | AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Identity(IdentityError::NoIdentity | IdentityError::InvalidSession(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Cart(err) => match err {
                CartError::ItemNotFound(_) => StatusCode::NOT_FOUND,
                CartError::ItemUnavailable(_)
                | CartError::InvalidQuantity(_)
                | CartError::QuantityOverflow(_)
                | CartError::NoActiveCart
                | CartError::EmptyCart => StatusCode::BAD_REQUEST,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(err) => match err {
                CatalogError::BlankName | CatalogError::NameTooLong => StatusCode::BAD_REQUEST,
                CatalogError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Database(_)
            | Self::Internal(_)
            | Self::Auth(
                AuthError::TokenIssue | AuthError::PasswordHash | AuthError::Repository(_),
            )
            | Self::Cart(CartError::Repository(_))
            | Self::Catalog(CatalogError::Repository(_)) => "internal_error",
            Self::Auth(err) => match err {
                AuthError::InvalidUsername(_) => "invalid_username",
                AuthError::WeakPassword(_) => "weak_password",
                AuthError::UserAlreadyExists => "user_exists",
                AuthError::InvalidCredentials => "invalid_credentials",
                AuthError::UserNotFound => "user_not_found",
                AuthError::MissingToken => "missing_token",
                AuthError::InvalidAuthScheme => "invalid_auth_header",
                AuthError::MalformedToken => "malformed_token",
                AuthError::ExpiredToken => "token_expired",
                _ => "invalid_token",
            },
            Self::Identity(IdentityError::NoIdentity) => "identity_required",
            Self::Identity(IdentityError::InvalidSession(_)) => "invalid_session",
            Self::Cart(err) => match err {
                CartError::ItemNotFound(_) => "item_not_found",
                CartError::ItemUnavailable(_) => "item_unavailable",
                CartError::InvalidQuantity(_) | CartError::QuantityOverflow(_) => {
                    "invalid_quantity"
                }
                CartError::NoActiveCart => "no_active_cart",
                _ => "empty_cart",
            },
            Self::Catalog(_) => "invalid_item",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad_request",
        }
    }

    /// The underlying store error, for server errors that have one.
    fn repository_error(&self) -> Option<&RepositoryError> {
        match self {
            Self::Database(err)
            | Self::Auth(AuthError::Repository(err))
            | Self::Cart(CartError::Repository(err))
            | Self::Catalog(CatalogError::Repository(err)) => Some(err),
            _ => None,
        }
    }

    /// Message shown to clients. Server errors get a generic message.
    fn client_message(&self) -> String {
        if self.status().is_server_error() {
            return INTERNAL_MESSAGE.to_string();
        }
        match self {
            Self::Auth(err) => capitalize(&err.to_string()),
            Self::Identity(err) => capitalize(&err.to_string()),
            Self::Cart(err) => capitalize(&err.to_string()),
            Self::Catalog(err) => capitalize(&err.to_string()),
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Extra detail for server errors: the store driver's message.
    fn details(&self) -> Option<String> {
        if !self.status().is_server_error() {
            return None;
        }
        match self.repository_error() {
            Some(RepositoryError::Database(err)) => Some(err.to_string()),
            Some(other) => Some(other.to_string()),
            None => match self {
                Self::Internal(msg) => Some(msg.clone()),
                _ => None,
            },
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }

        let body = ErrorBody {
            error: self.client_message(),
            code: self.code(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections render as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("item_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwheel_core::{ItemId, SessionTokenError};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("item-123".to_string());
        assert_eq!(err.to_string(), "Not found: item-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("test".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::BadRequest("test".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cart_error_mapping() {
        let cases = [
            (
                CartError::ItemNotFound(ItemId::new(1)),
                StatusCode::NOT_FOUND,
                "item_not_found",
            ),
            (
                CartError::ItemUnavailable(ItemId::new(1)),
                StatusCode::BAD_REQUEST,
                "item_unavailable",
            ),
            (
                CartError::InvalidQuantity(0),
                StatusCode::BAD_REQUEST,
                "invalid_quantity",
            ),
            (
                CartError::NoActiveCart,
                StatusCode::BAD_REQUEST,
                "no_active_cart",
            ),
            (
                CartError::QuantityOverflow(ItemId::new(1)),
                StatusCode::BAD_REQUEST,
                "invalid_quantity",
            ),
            (CartError::EmptyCart, StatusCode::BAD_REQUEST, "empty_cart"),
        ];
        for (err, status, code) in cases {
            let err = AppError::from(err);
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_auth_error_mapping() {
        let cases = [
            (AuthError::MissingToken, StatusCode::UNAUTHORIZED, "missing_token"),
            (AuthError::ExpiredToken, StatusCode::UNAUTHORIZED, "token_expired"),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED, "invalid_token"),
            (
                AuthError::InvalidCredentials,
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
            ),
            (
                AuthError::UserAlreadyExists,
                StatusCode::BAD_REQUEST,
                "user_exists",
            ),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND, "user_not_found"),
            (
                AuthError::PasswordHash,
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];
        for (err, status, code) in cases {
            let err = AppError::from(err);
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_no_identity_is_bad_request() {
        let err = AppError::from(IdentityError::NoIdentity);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "identity_required");

        let err = AppError::from(IdentityError::InvalidSession(SessionTokenError::Empty));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_session");
    }

    #[tokio::test]
    async fn test_client_error_body() {
        let (status, body) = body_json(CartError::EmptyCart.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot create order with empty cart");
        assert_eq!(body["code"], "empty_cart");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_server_error_body_has_details() {
        let err = AppError::Database(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["code"], "internal_error");
        assert!(!body["details"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("no active cart found"), "No active cart found");
        assert_eq!(capitalize(""), "");
    }
}
