//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (cap buffered body size)
//!     → headers.rs (strip hop-by-hop, force identity encoding)
//!     → Forward upstream
//!
//! Outgoing response:
//!     → headers.rs (fix framing after buffering/rewrite)
//!     → cors.rs (allow-origin echo, credentials, Vary)
//! ```

pub mod cors;
pub mod headers;
pub mod limits;
