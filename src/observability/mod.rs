//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request produces:
//!     → audit.rs (append-only access line, one per sanitized field)
//!     → metrics.rs (counters, latency histogram)
//!     → logging.rs (structured tracing events)
//! ```
//!
//! # Design Decisions
//! - The audit sink is injected, never a process global
//! - Audit writes go through a background worker; requests never wait on disk

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{AuditSink, FileAuditLog, MemoryAuditLog};
