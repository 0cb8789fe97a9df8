//! Datastore connection bootstrap.
//!
//! # Data Flow
//! ```text
//! DatastoreConfig (mode, dev_url, prod_url)
//!     → endpoint.rs (select and parse the endpoint for the mode)
//!     → connector.rs (connect with timeout, retry with backoff)
//!     → DatastoreHandle (readiness observed by handlers and /health)
//! ```
//!
//! # Design Decisions
//! - One connection attempt sequence per process, at startup
//! - Readiness is a watch channel; handlers never block on it
//! - Query semantics live in application code, not here

pub mod backoff;
pub mod connector;
pub mod endpoint;

pub use connector::{connect_with_retry, DatastoreConnector, DatastoreHandle, TcpConnector};
pub use endpoint::Endpoint;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("invalid datastore url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("connection to {endpoint} timed out after {timeout_secs}s")]
    Timeout { endpoint: String, timeout_secs: u64 },

    #[error("connection to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("datastore unreachable after {attempts} attempt(s)")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<DatastoreError>,
    },
}
