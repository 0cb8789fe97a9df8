//! Endpoint selection by deployment mode.

use std::fmt;

use url::Url;

use crate::config::{DatastoreConfig, DeploymentMode};
use crate::datastore::DatastoreError;

/// Port assumed when the URL names none.
pub const DEFAULT_PORT: u16 = 27017;

/// The datastore address selected for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub mode: DeploymentMode,
    pub host: String,
    pub port: u16,
    /// Database name from the URL path, if any.
    pub database: Option<String>,
}

impl Endpoint {
    pub fn from_config(config: &DatastoreConfig) -> Result<Self, DatastoreError> {
        Self::parse(config.mode, config.selected_url())
    }

    pub fn parse(mode: DeploymentMode, raw: &str) -> Result<Self, DatastoreError> {
        let invalid = |reason: String| DatastoreError::InvalidUrl {
            url: redact(raw),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".to_string()))?
            .to_string();
        let port = url.port().unwrap_or(DEFAULT_PORT);
        let database = url
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|db| !db.is_empty())
            .map(str::to_string);

        Ok(Self {
            mode,
            host,
            port,
            database,
        })
    }

    /// `host:port`, suitable for a socket connect.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

/// Strip credentials before a URL reaches a log line or error message.
fn redact(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if !url.username().is_empty() || url.password().is_some() {
                let _ = url.set_username("***");
                let _ = url.set_password(None);
            }
            url.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}
