//! Body size admission.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::errors::RawFailure;
use crate::http::middleware::AdmissionState;

/// Rejects oversized bodies with 413 before any handler runs.
///
/// The declared `Content-Length` is checked first; the body is then buffered
/// up to the limit so chunked uploads without a length are bounded too.
pub async fn body_limit_middleware(
    State(state): State<AdmissionState>,
    req: Request,
    next: Next,
) -> Result<Response, RawFailure> {
    let limit = state.body_limit;
    limit.check_declared(req.headers())?;

    let (mut parts, body) = req.into_parts();
    let bytes = limit.read(body).await?;

    if !parts.headers.contains_key(header::CONTENT_LENGTH) && !bytes.is_empty() {
        parts.headers.insert(header::CONTENT_LENGTH, bytes.len().into());
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
