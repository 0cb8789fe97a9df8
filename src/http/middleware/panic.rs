//! Panic boundary.
//!
//! A panicking handler is a programming defect. It is answered like any other
//! non-operational failure: logged in full, generic 500 to the client.

use std::any::Any;

use axum::response::Response;

use crate::errors::{normalize, RawFailure};

/// Response for a caught panic, used with `CatchPanicLayer::custom`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    normalize(RawFailure::Internal(format!("handler panicked: {detail}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_panic_payload_not_exposed() {
        let response = panic_response(Box::new("index out of bounds: the len is 0"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            &body[..],
            br#"{"status":"error","message":"Something went wrong"}"#
        );
    }
}
