//! HTTP parameter pollution protection.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::errors::RawFailure;
use crate::http::middleware::AdmissionState;
use crate::http::request::replace_query;
use crate::security::PollutedParams;

/// Collapses repeated query keys to their last value. The dropped values are
/// exposed to handlers through the [`PollutedParams`] extension, which is
/// always present (empty when nothing was collapsed).
pub async fn params_middleware(
    State(state): State<AdmissionState>,
    mut req: Request,
    next: Next,
) -> Result<Response, RawFailure> {
    let deduped = req
        .uri()
        .query()
        .and_then(|query| state.params.dedupe(query));

    match deduped {
        Some((query, polluted)) => {
            tracing::debug!(keys = polluted.0.len(), "Collapsed repeated query parameters");
            let uri = replace_query(req.uri(), &query)?;
            *req.uri_mut() = uri;
            req.extensions_mut().insert(polluted);
        }
        None => {
            req.extensions_mut().insert(PollutedParams::default());
        }
    }

    Ok(next.run(req).await)
}
