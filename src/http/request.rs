//! Request identity and context.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and echo it to the client
//! - Capture the request as it arrived, before any admission stage rewrites it
//! - Rewrite the query string of a URI in place
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Original URL preserved for logging; rewritten copy forwarded

use axum::extract::Request;
use axum::http::{uri::PathAndQuery, HeaderName, Method, Uri};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::errors::RawFailure;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer assigning a request ID to requests that do not carry one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request as it reached the gateway. Stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub method: Method,
    /// Path and query exactly as received.
    pub original_url: String,
}

impl RequestContext {
    pub fn from_request(req: &Request) -> Self {
        let request_id = req
            .headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            request_id,
            method: req.method().clone(),
            original_url: original_url(req.uri()),
        }
    }

    /// Context stored by the access log stage, or a fresh one.
    pub fn of(req: &Request) -> Self {
        req.extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| Self::from_request(req))
    }
}

fn original_url(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Replace the query string of `uri`, keeping scheme, authority and path.
pub fn replace_query(uri: &Uri, query: &str) -> Result<Uri, RawFailure> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query =
        Some(PathAndQuery::try_from(path_and_query).map_err(RawFailure::internal)?);
    Uri::from_parts(parts).map_err(RawFailure::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_context_keeps_query() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/users?sort=asc")
            .header("x-request-id", "req-1")
            .body(Body::empty())
            .unwrap();
        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.request_id, "req-1");
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.original_url, "/users?sort=asc");
    }

    #[test]
    fn test_stored_context_wins() {
        let mut req = Request::builder().uri("/rewritten?a=2").body(Body::empty()).unwrap();
        let stored = RequestContext {
            request_id: "r".into(),
            method: Method::GET,
            original_url: "/rewritten?a=1&a=2".into(),
        };
        req.extensions_mut().insert(stored.clone());
        assert_eq!(RequestContext::of(&req), stored);
    }

    #[test]
    fn test_replace_query() {
        let uri: Uri = "/search?a=1&a=2".parse().unwrap();
        assert_eq!(replace_query(&uri, "a=2").unwrap(), "/search?a=2");
        assert_eq!(replace_query(&uri, "").unwrap(), "/search");

        let absolute: Uri = "http://example.com/x?$gt=1".parse().unwrap();
        assert_eq!(
            replace_query(&absolute, "_gt=1").unwrap().to_string(),
            "http://example.com/x?_gt=1"
        );
    }
}
