//! Cross-origin admission policy.
//!
//! `allow = origin is absent OR origin is in the allow-list`.
//!
//! The comparison is exact string equality. A `"*"` entry therefore matches
//! only the literal origin `*` unless `wildcard_matches_any` is enabled.

use crate::config::CorsConfig;

/// Outcome of evaluating one request's `Origin` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorsDecision {
    pub allow: bool,
}

/// Allow-list based origin policy.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allow_list: Vec<String>,
    wildcard_matches_any: bool,
    allow_credentials: bool,
    options_success_status: u16,
}

impl OriginPolicy {
    pub fn new(allow_list: Vec<String>) -> Self {
        Self::from_config(&CorsConfig {
            allow_list,
            ..CorsConfig::default()
        })
    }

    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allow_list: config.allow_list.clone(),
            wildcard_matches_any: config.wildcard_matches_any,
            allow_credentials: config.allow_credentials,
            options_success_status: config.options_success_status,
        }
    }

    /// Decide whether a request carrying `origin` may proceed.
    pub fn evaluate(&self, origin: Option<&str>) -> CorsDecision {
        let allow = match origin {
            None => true,
            Some(origin) => self.allow_list.iter().any(|entry| {
                entry == origin || (self.wildcard_matches_any && entry == "*")
            }),
        };
        CorsDecision { allow }
    }

    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    pub fn options_success_status(&self) -> u16 {
        self.options_success_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_origin_always_allowed() {
        assert!(OriginPolicy::new(vec![]).evaluate(None).allow);
        assert!(OriginPolicy::new(vec!["https://a.example".into()]).evaluate(None).allow);
    }

    #[test]
    fn test_exact_membership() {
        let policy = OriginPolicy::new(vec!["https://a.example".into()]);
        assert!(policy.evaluate(Some("https://a.example")).allow);
        assert!(!policy.evaluate(Some("https://a.example.evil")).allow);
        assert!(!policy.evaluate(Some("http://a.example")).allow);
    }

    #[test]
    fn test_literal_wildcard_by_default() {
        let policy = OriginPolicy::from_config(&CorsConfig::default());
        assert!(!policy.evaluate(Some("http://evil.example")).allow);
        assert!(policy.evaluate(Some("*")).allow);
    }

    #[test]
    fn test_wildcard_opt_in() {
        let policy = OriginPolicy::from_config(&CorsConfig {
            wildcard_matches_any: true,
            ..CorsConfig::default()
        });
        assert!(policy.evaluate(Some("http://anything.example")).allow);
    }
}
