//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Key sanitization for request bodies and query strings.
    pub sanitize: SanitizeConfig,

    /// Duplicate query parameter handling.
    pub params: ParamsConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Audit (access) log destination.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Datastore endpoint selection and readiness.
    pub datastore: DatastoreConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Cross-origin policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to make cross-origin requests (exact match).
    pub allow_list: Vec<String>,

    /// When true, a `"*"` entry allows every origin. When false, `"*"` only
    /// matches an `Origin` header that is literally `*`.
    pub wildcard_matches_any: bool,

    /// Send `Access-Control-Allow-Credentials: true` on allowed responses.
    pub allow_credentials: bool,

    /// Status returned for preflight (`OPTIONS`) requests.
    pub options_success_status: u16,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_list: vec!["*".to_string()],
            wildcard_matches_any: false,
            allow_credentials: true,
            options_success_status: 200,
        }
    }
}

/// Key sanitization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Replacement for each disallowed character.
    pub replace_with: String,

    /// Leave `.` in keys untouched (only a leading `$` is rewritten).
    pub allow_dots: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            replace_with: "_".to_string(),
            allow_dots: true,
        }
    }
}

/// Duplicate query parameter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ParamsConfig {
    /// Parameter names allowed to appear more than once.
    pub allow_repeated: Vec<String>,
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024, // 1 MiB
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Path of the append-only access log.
    pub path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: "access.log".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directives (overridden by `RUST_LOG`).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "api_edge=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Deployment mode, selecting which datastore endpoint is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    /// Parse a `NODE_ENV`-style value. Anything but "production" is development.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            DeploymentMode::Production
        } else {
            DeploymentMode::Development
        }
    }
}

/// Datastore connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatastoreConfig {
    pub mode: DeploymentMode,

    /// Endpoint used in development mode.
    pub dev_url: String,

    /// Endpoint used in production mode.
    pub prod_url: String,

    /// Bind the listener only after the datastore is reachable.
    pub wait_for_ready: bool,

    /// Timeout for a single connection attempt in seconds.
    pub connect_timeout_secs: u64,

    /// Connection attempts before giving up.
    pub connect_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl DatastoreConfig {
    /// Endpoint for the configured deployment mode.
    pub fn selected_url(&self) -> &str {
        match self.mode {
            DeploymentMode::Development => &self.dev_url,
            DeploymentMode::Production => &self.prod_url,
        }
    }
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Development,
            dev_url: "mongodb://127.0.0.1:27017/app".to_string(),
            prod_url: "mongodb://127.0.0.1:27017/app".to_string(),
            wait_for_ready: true,
            connect_timeout_secs: 5,
            connect_attempts: 5,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [cors]
            allow_list = ["https://app.example"]
            "#,
        )
        .unwrap();
        assert_eq!(config.cors.allow_list, vec!["https://app.example"]);
        assert!(config.cors.allow_credentials);
        assert_eq!(config.limits.max_body_bytes, 1024 * 1024);
        assert_eq!(config.sanitize.replace_with, "_");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn test_mode_selects_url() {
        let mut config = DatastoreConfig {
            dev_url: "mongodb://dev:27017".into(),
            prod_url: "mongodb://prod:27017".into(),
            ..Default::default()
        };
        assert_eq!(config.selected_url(), "mongodb://dev:27017");
        config.mode = DeploymentMode::Production;
        assert_eq!(config.selected_url(), "mongodb://prod:27017");
    }

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(DeploymentMode::from_env_value("production"), DeploymentMode::Production);
        assert_eq!(DeploymentMode::from_env_value("PRODUCTION "), DeploymentMode::Production);
        assert_eq!(DeploymentMode::from_env_value("staging"), DeploymentMode::Development);
    }
}
