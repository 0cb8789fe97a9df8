//! Operator-key sanitization of the query string, header names and JSON bodies.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::errors::RawFailure;
use crate::http::middleware::AdmissionState;
use crate::http::request::{replace_query, RequestContext};
use crate::observability::{audit, metrics};
use crate::security::SanitizationEvent;

/// Rewrites `$`-prefixed and dotted keys before any handler sees them.
///
/// Each rewritten key produces one audit line and one warning. Bodies that
/// are not JSON, or fail to parse as JSON, are forwarded untouched.
pub async fn sanitize_middleware(
    State(state): State<AdmissionState>,
    req: Request,
    next: Next,
) -> Result<Response, RawFailure> {
    let ctx = RequestContext::of(&req);
    let (mut parts, body) = req.into_parts();
    let mut events = Vec::new();

    if let Some(query) = parts.uri.query() {
        if let Some((rewritten, query_events)) = state.sanitizer.sanitize_query(query) {
            parts.uri = replace_query(&parts.uri, &rewritten)?;
            events.extend(query_events);
        }
    }

    events.extend(state.sanitizer.sanitize_headers(&mut parts.headers));

    let body = if is_json(&parts.headers) {
        let bytes = state.body_limit.read(body).await?;
        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(mut value) => {
                let body_events = state.sanitizer.sanitize_json(&mut value);
                if body_events.is_empty() {
                    Body::from(bytes)
                } else {
                    events.extend(body_events);
                    let rewritten = serde_json::to_vec(&value).map_err(RawFailure::internal)?;
                    parts
                        .headers
                        .insert(header::CONTENT_LENGTH, rewritten.len().into());
                    Body::from(rewritten)
                }
            }
            Err(_) => Body::from(bytes),
        }
    } else {
        body
    };

    for event in &events {
        report(&state, &ctx, event);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

fn report(state: &AdmissionState, ctx: &RequestContext, event: &SanitizationEvent) {
    tracing::warn!(
        request_id = %ctx.request_id,
        location = %event.location,
        key = %event.key_path,
        "Sanitized request key"
    );
    state.audit.append(audit::sanitized_line(ctx, event));
    metrics::record_sanitized(event.location.as_str());
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let mime = v.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_is_json() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/merge-patch+json"));
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }
}
