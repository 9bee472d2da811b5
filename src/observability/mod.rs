//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms, /metrics snapshot)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → /health and /metrics JSON endpoints
//!     → Prometheus scrape (optional exporter)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through logs and the upstream request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
pub use metrics::{MemoryUsage, ProxyStats, StatsSnapshot};
