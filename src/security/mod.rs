//! Security subsystem: pure admission decisions.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (declared and streamed body size)
//!     → sanitize.rs (rewrite operator-injection keys)
//!     → params.rs (collapse repeated query parameters)
//!     → origin.rs (allow-list origin policy)
//! Outgoing response:
//!     → headers.rs (fixed security header set)
//! ```
//!
//! # Design Decisions
//! - No I/O here; the axum middleware in `http::middleware` drives these
//! - Sanitizing rewrites, it never removes or reorders fields

pub mod headers;
pub mod limits;
pub mod origin;
pub mod params;
pub mod sanitize;

pub use limits::BodyLimit;
pub use origin::{CorsDecision, OriginPolicy};
pub use params::{ParamDeduplicator, PollutedParams};
pub use sanitize::{KeySanitizer, Location, SanitizationEvent};
