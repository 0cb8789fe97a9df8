//! Access logging. Outermost admission stage: every request, matched,
//! rejected or unmatched, produces exactly one audit line.

use std::time::Instant;

use axum::{
    body::HttpBody,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::http::middleware::AdmissionState;
use crate::http::request::RequestContext;
use crate::observability::{audit, metrics};

pub async fn access_log_middleware(
    State(state): State<AdmissionState>,
    mut req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let ctx = RequestContext::from_request(&req);
    req.extensions_mut().insert(ctx.clone());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let content_length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .or_else(|| response.body().size_hint().exact());

    state
        .audit
        .append(audit::access_line(&ctx, status, start.elapsed(), content_length));
    metrics::record_request(ctx.method.as_str(), status, start);

    tracing::debug!(
        request_id = %ctx.request_id,
        method = %ctx.method,
        url = %ctx.original_url,
        status,
        "Request completed"
    );

    response
}
