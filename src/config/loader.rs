//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{DeploymentMode, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Selects the deployment mode (`production` or anything else).
pub const ENV_MODE: &str = "NODE_ENV";
pub const ENV_PROD_URL: &str = "MONGODB_PROD_URL";
pub const ENV_DEV_URL: &str = "MONGODB_DEV_URL";
pub const ENV_BIND: &str = "API_EDGE_BIND";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Like [`load_config`], starting from defaults when no file is given.
pub fn load_config_or_default(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finish(GatewayConfig::default(), |key| std::env::var(key).ok()),
    }
}

fn finish<F>(mut config: GatewayConfig, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `env` as the variable lookup.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(mode) = env(ENV_MODE) {
        config.datastore.mode = DeploymentMode::from_env_value(&mode);
    }
    if let Some(url) = env(ENV_PROD_URL) {
        config.datastore.prod_url = url;
    }
    if let Some(url) = env(ENV_DEV_URL) {
        config.datastore.dev_url = url;
    }
    if let Some(bind) = env(ENV_BIND) {
        config.listener.bind_address = bind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_MODE, "production"),
            (ENV_PROD_URL, "mongodb://db.internal:27017/prod"),
            (ENV_BIND, "127.0.0.1:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.datastore.mode, DeploymentMode::Production);
        assert_eq!(config.datastore.selected_url(), "mongodb://db.internal:27017/prod");
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
            [listener]
            bind_address = "127.0.0.1:8123"

            [params]
            allow_repeated = ["tag"]
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8123");
        assert_eq!(config.params.allow_repeated, vec!["tag"]);
    }

    #[test]
    fn test_invalid_file_reports_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(&path, "[limits]\nmax_body_bytes = 0\n").unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "limits.max_body_bytes"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
