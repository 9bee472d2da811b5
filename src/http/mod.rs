//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID)
//!     → /health, /metrics (status module)
//!     → proxy prefix → proxy pipeline
//!     → anything else → static files
//!     → response.rs (failure → status code + body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{ProxyErrorBody, ProxyFailure};
pub use server::{AppState, HttpServer};
