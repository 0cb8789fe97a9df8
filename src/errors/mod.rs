//! Error normalization subsystem.
//!
//! # Data Flow
//! ```text
//! datastore adapter / token verifier / admission stage
//!     → failure.rs (typed RawFailure at the collaborator boundary)
//!     → normalizer.rs (classify: one match, one OperationalError)
//!     → operational.rs (status class derived from status code)
//!     → {"status": "fail"|"error", "message": "..."}
//! ```
//!
//! # Design Decisions
//! - Clients never see driver fields, stack traces or defect details
//! - Programming defects are logged in full and answered generically

pub mod failure;
pub mod normalizer;
pub mod operational;

pub use failure::{FieldViolation, RawFailure};
pub use normalizer::{classify, normalize, respond};
pub use operational::{OperationalError, StatusClass};
