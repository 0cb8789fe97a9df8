//! Security response headers.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::security::headers::apply_security_headers;

/// Adds the hardening header set to every response, including failures and
/// the catch-all 404. Headers already set by a handler are left alone.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut());
    response
}
