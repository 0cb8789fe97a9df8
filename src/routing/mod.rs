//! Route registration and the catch-all.
//!
//! # Data Flow
//! ```text
//! Application routers
//!     → router.rs (merge into one RouteTable)
//!     → fallback.rs (installed after every route is known)
//!     → Return: matched handler or the catch-all 404
//! ```
//!
//! # Design Decisions
//! - The catch-all is installed exactly once, after merging, so it never
//!   shadows a real route
//! - Unknown paths and known paths with an unsupported method both reach it

pub mod fallback;
pub mod router;

pub use fallback::not_found;
pub use router::RouteTable;
