//! API edge: the HTTP entry layer of a web backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────▶ request ID ─▶ access log ─▶ cookies ─▶ compression ─▶ security headers
//!                                                                        │
//!             ┌──────────────────────────────────────────────────────────┘
//!             ▼
//!         body limit ─▶ sanitize ─▶ parameter pollution ─▶ origin policy
//!                                                               │
//!                                                               ▼
//!                                          application routes ─▶ catch-all 404
//!
//!     Any stage or handler failing with a RawFailure
//!     ──────▶ errors::classify ─▶ OperationalError ─▶ {"status","message"}
//! ```
//!
//! Cross-cutting: `config` (TOML + env), `observability` (tracing, audit
//! log, metrics), `datastore` (endpoint selection and readiness),
//! `lifecycle` (startup and graceful shutdown).

// Core subsystems
pub mod config;
pub mod errors;
pub mod http;
pub mod routing;
pub mod security;

// Cross-cutting concerns
pub mod datastore;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use errors::{OperationalError, RawFailure};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
