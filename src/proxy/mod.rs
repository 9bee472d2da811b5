//! Rewriting reverse proxy.
//!
//! # Data Flow
//! ```text
//! request under the proxy prefix
//!     → pipeline.rs (strip prefix, buffer inbound body)
//!     → forward.rs (single upstream attempt, Accept-Encoding: identity)
//!     → rewrite.rs (gate + origin substitution on the buffered body)
//!     → origin.rs (public origin used as the substitution target)
//!     → security::cors / security::headers (CORS, framing)
//!     → client
//! ```

pub mod forward;
pub mod origin;
pub mod pipeline;
pub mod rewrite;

pub use forward::{UpstreamClient, UpstreamError};
pub use origin::OriginResolver;
pub use pipeline::{PipelineError, ProxyPipeline};
pub use rewrite::{OriginRewriter, RewriteGate, Rewritten};
