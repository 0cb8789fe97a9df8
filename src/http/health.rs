//! Liveness route.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::datastore::DatastoreHandle;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub datastore: &'static str,
}

async fn health(State(datastore): State<DatastoreHandle>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        datastore: datastore.status(),
    })
}

/// `GET /health`, reporting datastore readiness. Always 200 while the
/// process is serving.
pub fn health_routes(datastore: DatastoreHandle) -> axum::Router {
    Router::new()
        .route("/health", get(health))
        .with_state(datastore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn body_of(handle: DatastoreHandle) -> String {
        let response = health_routes(handle)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_reports_datastore_state() {
        let handle = DatastoreHandle::new();
        assert_eq!(
            body_of(handle.clone()).await,
            r#"{"status":"ok","datastore":"connecting"}"#
        );

        handle.mark_ready();
        assert_eq!(body_of(handle).await, r#"{"status":"ok","datastore":"ready"}"#);
    }
}
