//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce the upstream deadline)
//!     → On failure: report to the client, never retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - A single upstream attempt per client request

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineElapsed};
