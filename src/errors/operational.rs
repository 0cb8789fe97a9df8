//! Normalized, client-safe error value.
//!
//! # Responsibilities
//! - Hold the message and HTTP status sent to the client
//! - Derive the status class (`fail` / `error`) from the status code
//! - Mark whether the error is operational or a programming defect
//!
//! # Design Decisions
//! - Immutable once constructed: fields are private, accessors only
//! - Status class is never stored independently of the status code

use std::fmt;

use axum::http::StatusCode;
use serde::Serialize;

/// Message returned to clients for failures whose detail must not leak.
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// Coarse class of a failed response, written as the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    /// The client sent something wrong (4xx).
    Fail,
    /// The server could not complete the request (everything else).
    Error,
}

impl StatusClass {
    /// Class for a status code: `fail` for 4xx, `error` otherwise.
    pub fn of(status: StatusCode) -> Self {
        if status.is_client_error() {
            StatusClass::Fail
        } else {
            StatusClass::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Fail => "fail",
            StatusClass::Error => "error",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure, ready to be written as an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationalError {
    message: String,
    status_code: StatusCode,
    is_operational: bool,
}

impl OperationalError {
    /// Create an operational error with the given client-facing message.
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            status_code,
            is_operational: true,
        }
    }

    /// Create the error reported for a programming defect.
    ///
    /// The message is always [`GENERIC_MESSAGE`]; callers log the detail.
    pub fn internal() -> Self {
        Self {
            message: GENERIC_MESSAGE.to_string(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            is_operational: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(self.status_code)
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    /// The JSON body written to the client.
    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            status: self.status_class(),
            message: &self.message,
        }
    }
}

impl fmt::Display for OperationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code.as_u16())
    }
}

impl std::error::Error for OperationalError {}

/// Failure envelope: `{"status": "fail"|"error", "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: StatusClass,
    pub message: &'a str,
}
