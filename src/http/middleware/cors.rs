//! Cross-origin admission and preflight handling.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::RawFailure;
use crate::http::middleware::AdmissionState;
use crate::observability::metrics;

/// Methods advertised in preflight responses.
pub const PREFLIGHT_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Answers every `OPTIONS` request as a permissive preflight, then applies
/// the origin allow-list to everything else.
///
/// Preflight runs before the origin check, so an `OPTIONS` request succeeds
/// even from an origin the allow-list would reject.
pub async fn cors_middleware(
    State(state): State<AdmissionState>,
    req: Request,
    next: Next,
) -> Result<Response, RawFailure> {
    let policy = &state.origin_policy;

    if req.method() == Method::OPTIONS {
        return Ok(preflight(req.headers(), policy.options_success_status()));
    }

    let origin = req
        .headers()
        .get(header::ORIGIN)
        .map(|v| v.to_str().map(str::to_string).unwrap_or_default());

    if !policy.evaluate(origin.as_deref()).allow {
        let origin = origin.unwrap_or_default();
        tracing::warn!(origin = %origin, "Origin rejected");
        metrics::record_origin_rejected();
        return Err(RawFailure::OriginRejected(origin));
    }

    let mut response = next.run(req).await;
    if let Some(origin) = origin.and_then(|o| HeaderValue::from_str(&o).ok()) {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        if policy.allow_credentials() {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
    Ok(response)
}

fn preflight(request_headers: &HeaderMap, status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    let mut response = status.into_response();
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_METHODS),
    );
    if let Some(requested) = request_headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        headers.append(
            header::VARY,
            HeaderValue::from_static("Access-Control-Request-Headers"),
        );
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}
