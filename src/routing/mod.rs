//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (route lookup)
//!     → matcher.rs (prefix match + strip)
//!     → Return: Proxy { upstream_path } or Static
//! ```
//!
//! # Design Decisions
//! - Single prefix compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::PathPrefixMatcher;
pub use router::{ProxyRouter, RouteMatch};
