//! Upstream failure signals.
//!
//! Every collaborator that can fail a request (datastore adapter, token
//! verifier, admission stages) reports a [`RawFailure`] variant at its own
//! boundary. Untyped payloads coming from dynamic sources are converted once
//! by [`RawFailure::from_signal`].

use axum::extract::rejection::JsonRejection;
use serde_json::Value;
use thiserror::Error;

/// Datastore driver code for a unique-index violation.
pub const DUPLICATE_KEY_CODE: i64 = 11000;

/// One field that failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A failure raised before the error normalizer, in any of its known shapes.
#[derive(Debug, Error)]
pub enum RawFailure {
    /// A value could not be cast to the type stored at `path`.
    #[error("cast to {path} failed for value {value}")]
    Cast { path: String, value: String },

    /// A unique index rejected a write. `fields` lists the offending key/value pairs.
    #[error("duplicate key {fields:?}")]
    DuplicateKey { fields: Vec<(String, String)> },

    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token expired")]
    ExpiredToken,

    /// The `Origin` header is not in the allow-list.
    #[error("origin {0} not allowed")]
    OriginRejected(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The request body could not be read or decoded.
    #[error("malformed body: {0}")]
    MalformedBody(String),

    #[error("datastore unavailable")]
    DatastoreUnavailable,

    /// Anything without a known discriminant; may carry its own message/status.
    #[error("unclassified failure: {}", .message.as_deref().unwrap_or("<none>"))]
    Unclassified {
        message: Option<String>,
        status_code: Option<u16>,
    },

    /// A programming defect. The detail is logged and never sent to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RawFailure {
    /// Short, stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RawFailure::Cast { .. } => "cast",
            RawFailure::DuplicateKey { .. } => "duplicate_key",
            RawFailure::Validation(_) => "validation",
            RawFailure::MalformedToken(_) => "malformed_token",
            RawFailure::ExpiredToken => "expired_token",
            RawFailure::OriginRejected(_) => "origin_rejected",
            RawFailure::PayloadTooLarge { .. } => "payload_too_large",
            RawFailure::MalformedBody(_) => "malformed_body",
            RawFailure::DatastoreUnavailable => "datastore_unavailable",
            RawFailure::Unclassified { .. } => "unclassified",
            RawFailure::Internal(_) => "internal",
        }
    }

    /// Wrap any error as a programming defect.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        RawFailure::Internal(err.to_string())
    }

    /// Convert a dynamically shaped failure payload into a typed variant.
    ///
    /// Discriminants are tested once, first hit wins, in the order
    /// expired token, malformed token, validation, duplicate key, cast.
    /// A payload matching several discriminants therefore resolves to the
    /// same kind the sequential overwrite in older handlers produced.
    pub fn from_signal(payload: &Value) -> Self {
        let name = payload.get("name").and_then(Value::as_str);
        let code = payload.get("code").and_then(Value::as_i64);

        if name == Some("TokenExpiredError") {
            return RawFailure::ExpiredToken;
        }
        if name == Some("JsonWebTokenError") {
            let reason = string_field(payload, "message").unwrap_or_default();
            return RawFailure::MalformedToken(reason);
        }
        if name == Some("ValidationError") {
            return RawFailure::Validation(violations(payload.get("errors")));
        }
        if code == Some(DUPLICATE_KEY_CODE) {
            let fields = match payload.get("keyValue") {
                Some(Value::Object(map)) => map
                    .iter()
                    .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                    .collect(),
                _ => Vec::new(),
            };
            return RawFailure::DuplicateKey { fields };
        }
        if name == Some("CastError") {
            return RawFailure::Cast {
                path: string_field(payload, "path").unwrap_or_default(),
                value: payload.get("value").map(scalar_to_string).unwrap_or_default(),
            };
        }

        RawFailure::Unclassified {
            message: string_field(payload, "message"),
            status_code: payload
                .get("statusCode")
                .and_then(Value::as_u64)
                .and_then(|c| u16::try_from(c).ok()),
        }
    }
}

impl From<JsonRejection> for RawFailure {
    fn from(rejection: JsonRejection) -> Self {
        RawFailure::MalformedBody(rejection.body_text())
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Per-field messages from an `errors` container, in container order.
fn violations(errors: Option<&Value>) -> Vec<FieldViolation> {
    match errors {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(field, entry)| {
                FieldViolation::new(field.clone(), violation_message(field, entry))
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let field = entry
                    .get("path")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| i.to_string());
                let message = violation_message(&field, entry);
                FieldViolation::new(field, message)
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Client-safe message for one violation. Driver objects are never echoed.
fn violation_message(field: &str, entry: &Value) -> String {
    match entry {
        Value::String(message) => message.clone(),
        _ => entry
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{field} is invalid")),
    }
}
