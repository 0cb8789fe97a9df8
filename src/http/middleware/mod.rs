//! Admission filter chain middleware.
//!
//! Each stage is an axum `from_fn_with_state` middleware sharing one
//! [`AdmissionState`]. Stages that reject a request return a `RawFailure`,
//! which the error normalizer turns into the response.

pub mod access_log;
pub mod body_limit;
pub mod cookies;
pub mod cors;
pub mod panic;
pub mod params;
pub mod sanitize;
pub mod security_headers;

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::observability::AuditSink;
use crate::security::{BodyLimit, KeySanitizer, OriginPolicy, ParamDeduplicator};

pub use access_log::access_log_middleware;
pub use body_limit::body_limit_middleware;
pub use cookies::{cookie_middleware, Cookies};
pub use cors::cors_middleware;
pub use panic::panic_response;
pub use params::params_middleware;
pub use sanitize::sanitize_middleware;
pub use security_headers::security_headers_middleware;

/// Everything the admission stages need, built once from the configuration.
#[derive(Clone)]
pub struct AdmissionState {
    pub audit: Arc<dyn AuditSink>,
    pub origin_policy: Arc<OriginPolicy>,
    pub sanitizer: Arc<KeySanitizer>,
    pub params: Arc<ParamDeduplicator>,
    pub body_limit: BodyLimit,
}

impl AdmissionState {
    pub fn new(config: &GatewayConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            audit,
            origin_policy: Arc::new(OriginPolicy::from_config(&config.cors)),
            sanitizer: Arc::new(KeySanitizer::from_config(&config.sanitize)),
            params: Arc::new(ParamDeduplicator::from_config(&config.params)),
            body_limit: BodyLimit::new(config.limits.max_body_bytes),
        }
    }
}
