//! HTTP server setup.
//!
//! # Responsibilities
//! - Compose the admission filter chain around the application routes
//! - Bind the router to a listener
//! - Stop accepting and drain in-flight requests on shutdown
//!
//! # Design Decisions
//! - Stage order is fixed here and nowhere else; `ServiceBuilder` lists
//!   layers outermost first
//! - Access logging wraps every other stage so rejections are logged too
//! - Panics are caught just inside the access log, so they are logged and
//!   answered with a generic 500

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::middleware::{
    access_log_middleware, body_limit_middleware, cookie_middleware, cors_middleware,
    panic_response, params_middleware, sanitize_middleware, security_headers_middleware,
    AdmissionState,
};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::AuditSink;
use crate::routing::RouteTable;

/// The HTTP entry point: admission chain, application routes, catch-all.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, routes: RouteTable, audit: Arc<dyn AuditSink>) -> Self {
        let router = Self::build_router(&config, routes, audit);
        Self { router, config }
    }

    /// Build the complete router. Exposed so tests can drive it without a socket.
    ///
    /// Outermost to innermost:
    /// request ID, trace span, access log, panic boundary, cookies, response compression,
    /// security headers, body limit, sanitize, parameter pollution, origin
    /// policy, routes with the catch-all.
    pub fn build_router(
        config: &GatewayConfig,
        routes: RouteTable,
        audit: Arc<dyn AuditSink>,
    ) -> Router {
        let state = AdmissionState::new(config, audit);

        routes.into_router().layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(from_fn_with_state(state.clone(), access_log_middleware))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(from_fn(cookie_middleware))
                .layer(CompressionLayer::new())
                .layer(from_fn(security_headers_middleware))
                .layer(from_fn_with_state(state.clone(), body_limit_middleware))
                .layer(from_fn_with_state(state.clone(), sanitize_middleware))
                .layer(from_fn_with_state(state.clone(), params_middleware))
                .layer(from_fn_with_state(state, cors_middleware)),
        )
    }

    /// A clone of the assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
