//! HTTP entry layer.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID, original URL captured)
//!     → middleware/ (admission filter chain, one stage per file)
//!     → routing (application routes, then the catch-all)
//!     → errors (every rejection normalized to one envelope)
//!     → response.rs / normalizer (JSON envelope back to the client)
//! ```

pub mod health;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{AdmissionState, Cookies};
pub use request::{RequestContext, X_REQUEST_ID};
pub use server::HttpServer;
