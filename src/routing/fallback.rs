//! Catch-all for requests no route claimed.

use axum::extract::Request;

use crate::http::request::RequestContext;
use crate::http::response::NotFoundBody;
use crate::observability::metrics;

/// Always 404, naming the URL as the client sent it (query included).
pub async fn not_found(req: Request) -> NotFoundBody {
    let ctx = RequestContext::of(&req);
    tracing::debug!(
        request_id = %ctx.request_id,
        method = %ctx.method,
        url = %ctx.original_url,
        "No route matched"
    );
    metrics::record_unmatched_route();
    NotFoundBody::for_url(&ctx.original_url)
}
