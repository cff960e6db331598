//! Request ID middleware for request tracing and correlation.
//!
//! Uses the upstream `x-request-id` when it looks sane, otherwise generates a
//! UUID v4. The ID is recorded on the `http_request` span, tagged on the
//! Sentry scope, and returned in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Upstream IDs longer than this are replaced.
const MAX_UPSTREAM_ID_LENGTH: usize = 128;

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = upstream_request_id(request.headers().get(REQUEST_ID_HEADER))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Accept an upstream ID only if it is short, non-empty, visible ASCII.
fn upstream_request_id(value: Option<&HeaderValue>) -> Option<String> {
    let value = value?.to_str().ok()?.trim();
    let acceptable = !value.is_empty()
        && value.len() <= MAX_UPSTREAM_ID_LENGTH
        && value.chars().all(|c| c.is_ascii_graphic());
    acceptable.then(|| value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_kept() {
        let value = HeaderValue::from_static("cf-1234-abcd");
        assert_eq!(
            upstream_request_id(Some(&value)).as_deref(),
            Some("cf-1234-abcd")
        );
    }

    #[test]
    fn test_missing_or_bad_upstream_id() {
        assert_eq!(upstream_request_id(None), None);
        let blank = HeaderValue::from_static("   ");
        assert_eq!(upstream_request_id(Some(&blank)), None);
        let long = HeaderValue::from_str(&"a".repeat(129)).unwrap_or_else(|_| blank.clone());
        assert_eq!(upstream_request_id(Some(&long)), None);
    }
}
