//! Terminal error stage: classify a failure and write it to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::errors::failure::{FieldViolation, RawFailure};
use crate::errors::operational::{OperationalError, GENERIC_MESSAGE};
use crate::observability::metrics;

/// Map a failure to exactly one [`OperationalError`].
pub fn classify(failure: &RawFailure) -> OperationalError {
    match failure {
        RawFailure::Cast { path, value } => {
            OperationalError::new(format!("Invalid {path}: {value}"), StatusCode::BAD_REQUEST)
        }
        RawFailure::DuplicateKey { fields } => {
            OperationalError::new(duplicate_message(fields), StatusCode::BAD_REQUEST)
        }
        RawFailure::Validation(violations) => {
            OperationalError::new(validation_message(violations), StatusCode::BAD_REQUEST)
        }
        RawFailure::MalformedToken(_) => {
            OperationalError::new("Invalid jwt", StatusCode::UNAUTHORIZED)
        }
        // 404 rather than 401 is what existing clients have been receiving.
        RawFailure::ExpiredToken => {
            OperationalError::new("your jwt token has expired", StatusCode::NOT_FOUND)
        }
        RawFailure::OriginRejected(_) => {
            OperationalError::new("Not allowed by CORS", StatusCode::FORBIDDEN)
        }
        RawFailure::PayloadTooLarge { limit } => OperationalError::new(
            format!("Request body exceeds {limit} bytes"),
            StatusCode::PAYLOAD_TOO_LARGE,
        ),
        RawFailure::MalformedBody(reason) => OperationalError::new(
            format!("Invalid request body: {reason}"),
            StatusCode::BAD_REQUEST,
        ),
        RawFailure::DatastoreUnavailable => OperationalError::new(
            "Service temporarily unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        RawFailure::Unclassified {
            message,
            status_code,
        } => {
            let status = status_code
                .and_then(|c| StatusCode::from_u16(c).ok())
                .filter(|s| s.is_client_error() || s.is_server_error());
            match (message, status) {
                (Some(message), Some(status)) => OperationalError::new(message.clone(), status),
                _ => OperationalError::new(GENERIC_MESSAGE, StatusCode::INTERNAL_SERVER_ERROR),
            }
        }
        RawFailure::Internal(_) => OperationalError::internal(),
    }
}

fn duplicate_message(fields: &[(String, String)]) -> String {
    let value = fields
        .iter()
        .find(|(key, _)| key == "email")
        .or_else(|| fields.first())
        .map(|(_, value)| value.as_str())
        .unwrap_or("value");
    format!("{value} already exist")
}

fn validation_message(violations: &[FieldViolation]) -> String {
    let joined = violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join(". ");
    format!("Invalid input data. {joined}")
}

/// Write a classified error as `{status, message}` with its status code.
pub fn respond(error: &OperationalError) -> Response {
    let mut response = (error.status_code(), Json(error.body())).into_response();
    response.extensions_mut().insert(error.clone());
    response
}

/// Classify, log and respond. The only path failures take to the client.
pub fn normalize(failure: RawFailure) -> Response {
    let error = classify(&failure);
    let status = error.status_code().as_u16();

    if !error.is_operational() {
        tracing::error!(kind = failure.kind(), status, detail = %failure, "Unexpected failure");
    } else if error.status_code().is_server_error() {
        tracing::error!(kind = failure.kind(), status, detail = %failure, client_message = error.message(), "Request failed");
    } else {
        tracing::warn!(kind = failure.kind(), status, client_message = error.message(), "Request rejected");
    }
    metrics::record_failure(failure.kind(), status);

    respond(&error)
}

impl IntoResponse for RawFailure {
    fn into_response(self) -> Response {
        normalize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_cast_error() {
        let err = classify(&RawFailure::Cast {
            path: "_id".into(),
            value: "not-an-id".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid _id: not-an-id");
    }

    #[test]
    fn test_duplicate_key_prefers_email() {
        let err = classify(&RawFailure::DuplicateKey {
            fields: vec![
                ("username".into(), "sam".into()),
                ("email".into(), "sam@example.com".into()),
            ],
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "sam@example.com already exist");

        let err = classify(&RawFailure::DuplicateKey {
            fields: vec![("username".into(), "sam".into())],
        });
        assert!(err.message().ends_with("already exist"));
        assert!(err.message().starts_with("sam"));
    }

    #[test]
    fn test_validation_joins_messages() {
        let err = classify(&RawFailure::Validation(vec![
            FieldViolation::new("name", "Name is required"),
            FieldViolation::new("age", "Age must be positive"),
        ]));
        assert_eq!(
            err.message(),
            "Invalid input data. Name is required. Age must be positive"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_token_errors_keep_their_codes() {
        let malformed = classify(&RawFailure::MalformedToken("jwt malformed".into()));
        assert_eq!(malformed.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(malformed.message(), "Invalid jwt");

        let expired = classify(&RawFailure::ExpiredToken);
        assert_eq!(expired.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(expired.message(), "your jwt token has expired");
    }

    #[test]
    fn test_unclassified_pass_through_and_default() {
        let passed = classify(&RawFailure::Unclassified {
            message: Some("I'm a teapot".into()),
            status_code: Some(418),
        });
        assert_eq!(passed.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(passed.message(), "I'm a teapot");

        let no_status = classify(&RawFailure::Unclassified {
            message: Some("db exploded at 0x1234".into()),
            status_code: None,
        });
        assert_eq!(no_status.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(no_status.message(), GENERIC_MESSAGE);

        let success_code = classify(&RawFailure::Unclassified {
            message: Some("ok?".into()),
            status_code: Some(200),
        });
        assert_eq!(success_code.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_does_not_leak() {
        let err = classify(&RawFailure::internal("connection string postgres://secret"));
        assert!(!err.is_operational());
        assert!(!err.message().contains("secret"));
    }

    #[tokio::test]
    async fn test_response_envelope() {
        let response = RawFailure::ExpiredToken.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "fail", "message": "your jwt token has expired"})
        );
    }

    #[tokio::test]
    async fn test_server_error_class() {
        let response = RawFailure::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], GENERIC_MESSAGE);
    }
}
