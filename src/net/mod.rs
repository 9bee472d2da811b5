//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → plain: tokio TcpListener → axum::serve
//!     → TLS:   tls.rs (certificate loading) → axum-server rustls acceptor
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and chosen at startup
//! - Missing certificate files are fatal before any socket is bound

pub mod tls;

pub use tls::{load_tls_config, TlsError};
