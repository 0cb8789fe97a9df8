//! Route table assembly.
//!
//! # Responsibilities
//! - Collect application routers under their mount paths
//! - Freeze them into one axum `Router` with the catch-all attached

use axum::{routing::MethodRouter, Router};

use crate::routing::fallback::not_found;

/// Application routes, registered before the gateway starts.
#[derive(Default)]
pub struct RouteTable {
    router: Router,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single handler at `path`.
    pub fn route(mut self, path: &str, handler: MethodRouter) -> Self {
        self.router = self.router.route(path, handler);
        self
    }

    /// Mount a whole application router under `prefix`, or at the root when
    /// `prefix` is `/`.
    pub fn mount(mut self, prefix: &str, routes: Router) -> Self {
        self.router = if prefix == "/" || prefix.is_empty() {
            self.router.merge(routes)
        } else {
            self.router.nest(prefix, routes)
        };
        self
    }

    /// Final router with the catch-all installed.
    pub fn into_router(self) -> Router {
        self.router
            .fallback(not_found)
            .method_not_allowed_fallback(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    fn table() -> RouteTable {
        let users = Router::new().route("/", get(|| async { "users" }));
        RouteTable::new()
            .route("/ping", get(|| async { "pong" }))
            .mount("/api/v1/users", users)
    }

    async fn call(uri: &str, method: &str) -> (StatusCode, String) {
        let response = table()
            .into_router()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_registered_routes_match() {
        assert_eq!(call("/ping", "GET").await, (StatusCode::OK, "pong".to_string()));
        assert_eq!(
            call("/api/v1/users", "GET").await,
            (StatusCode::OK, "users".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_path_hits_catch_all() {
        let (status, body) = call("/nope?x=1", "GET").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            r#"{"status":"failure","message":"cannot find /nope?x=1 on the server"}"#
        );
    }

    #[tokio::test]
    async fn test_wrong_method_hits_catch_all() {
        let (status, body) = call("/ping", "DELETE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("cannot find /ping on the server"));
    }
}
