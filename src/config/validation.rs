//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, status codes, addresses)
//! - Reject sanitizer settings that would not be idempotent
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint, collecting all violations.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.cors.allow_list.iter().any(|o| o.trim().is_empty()) {
        errors.push(ValidationError::new("cors.allow_list", "entries must not be empty"));
    }
    if !(200..=299).contains(&config.cors.options_success_status) {
        errors.push(ValidationError::new(
            "cors.options_success_status",
            "must be a 2xx status",
        ));
    }

    let replace_with = &config.sanitize.replace_with;
    if replace_with.is_empty() {
        errors.push(ValidationError::new("sanitize.replace_with", "must not be empty"));
    } else if replace_with.contains('$')
        || (!config.sanitize.allow_dots && replace_with.contains('.'))
    {
        errors.push(ValidationError::new(
            "sanitize.replace_with",
            "must not contain characters that are themselves sanitized",
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    if config.audit.path.trim().is_empty() {
        errors.push(ValidationError::new("audit.path", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    let datastore = &config.datastore;
    match Url::parse(datastore.selected_url()) {
        Ok(url) if url.host_str().is_some() => {}
        Ok(_) => errors.push(ValidationError::new("datastore.url", "endpoint has no host")),
        Err(e) => errors.push(ValidationError::new(
            "datastore.url",
            format!("endpoint is not a URL: {e}"),
        )),
    }
    if datastore.connect_attempts == 0 {
        errors.push(ValidationError::new("datastore.connect_attempts", "must be at least 1"));
    }
    if datastore.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "datastore.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.limits.max_body_bytes = 0;
        config.sanitize.replace_with = "$".into();
        config.datastore.dev_url = "not a url".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "sanitize.replace_with",
                "limits.max_body_bytes",
                "datastore.url"
            ]
        );
    }

    #[test]
    fn test_dot_replacement_rejected_without_allow_dots() {
        let mut config = GatewayConfig::default();
        config.sanitize.replace_with = ".".into();
        assert!(validate_config(&config).is_ok());

        config.sanitize.allow_dots = false;
        assert!(validate_config(&config).is_err());
    }
}
