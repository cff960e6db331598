//! HTTP middleware and request extractors for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, one hub per request)
//! 2. CORS
//! 3. `TraceLayer` (`http_request` span per request)
//! 4. Request ID (fills `request_id` on that span, echoes `x-request-id`)
//!
//! # Extractors
//!
//! - [`RequireAuth`] / [`OptionalAuth`] - bearer token in `Authorization`
//! - [`SessionHeader`] - anonymous session token in `X-Session-ID`

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth};
pub use request_id::request_id_middleware;
pub use session::{SESSION_HEADER, SessionHeader};
