//! Response envelopes written by the gateway itself.
//!
//! Failure responses from the error normalizer use
//! [`crate::errors::operational::ErrorBody`]. The catch-all answers with its
//! own envelope whose status word is `failure`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body of the catch-all response for unmatched routes.
#[derive(Debug, Serialize)]
pub struct NotFoundBody {
    pub status: &'static str,
    pub message: String,
}

impl NotFoundBody {
    pub fn for_url(original_url: &str) -> Self {
        Self {
            status: "failure",
            message: format!("cannot find {original_url} on the server"),
        }
    }
}

impl IntoResponse for NotFoundBody {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, Json(self)).into_response()
    }
}
