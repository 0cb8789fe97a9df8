//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use api_edge::config::GatewayConfig;
use api_edge::http::Cookies;
use api_edge::lifecycle::Shutdown;
use api_edge::observability::MemoryAuditLog;
use api_edge::security::PollutedParams;
use api_edge::{HttpServer, RawFailure, RouteTable};
use axum::{
    extract::{rejection::JsonRejection, Path},
    http::Uri,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const ALLOWED_ORIGIN: &str = "https://app.example.com";

/// Defaults plus one real origin on the allow-list.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.cors.allow_list = vec!["*".to_string(), ALLOWED_ORIGIN.to_string()];
    config
}

/// A small application standing in for the business routers.
pub fn app_routes() -> RouteTable {
    let users = Router::new().route("/{id}", get(find_user));

    RouteTable::new()
        .route("/echo", get(echo_query).post(echo_body))
        .route("/fail", post(fail_with_signal))
        .route("/boom", get(boom))
        .mount("/api/v1/users", users)
}

async fn echo_query(
    uri: Uri,
    cookies: Cookies,
    Extension(polluted): Extension<PollutedParams>,
) -> Json<Value> {
    let polluted: serde_json::Map<String, Value> = polluted
        .0
        .into_iter()
        .map(|(k, values)| (k, json!(values)))
        .collect();
    Json(json!({
        "query": uri.query().unwrap_or(""),
        "polluted": polluted,
        "cookies": cookies.len(),
    }))
}

async fn echo_body(body: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, RawFailure> {
    let Json(body) = body?;
    Ok(Json(body))
}

async fn fail_with_signal(Json(signal): Json<Value>) -> Result<Json<Value>, RawFailure> {
    Err(RawFailure::from_signal(&signal))
}

async fn boom() -> Json<Value> {
    let empty: Vec<Value> = Vec::new();
    Json(empty[0].clone())
}

async fn find_user(Path(id): Path<String>) -> Result<Json<Value>, RawFailure> {
    let is_object_id = id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit());
    if !is_object_id {
        return Err(RawFailure::Cast {
            path: "_id".to_string(),
            value: id,
        });
    }
    Ok(Json(json!({ "id": id })))
}

/// Router plus the audit log it writes to, for `oneshot` tests.
pub fn test_router(config: &GatewayConfig) -> (Router, MemoryAuditLog) {
    let audit = MemoryAuditLog::new();
    let router = HttpServer::build_router(config, app_routes(), Arc::new(audit.clone()));
    (router, audit)
}

pub struct TestGateway {
    pub addr: SocketAddr,
    pub audit: MemoryAuditLog,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Serve the gateway on an ephemeral port.
pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let audit = MemoryAuditLog::new();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config, app_routes(), Arc::new(audit.clone()));
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, rx).await });

    TestGateway {
        addr,
        audit,
        shutdown,
        handle,
    }
}
