//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map proxy failures to client responses in one place
//! - Keep the JSON error shape stable for browser-side diagnostics
//!
//! # Design Decisions
//! - Upstream transport failures and timeouts are 500 with a JSON body
//! - Body stream failures are 500 with a plain-text body
//! - Errors are never retried by the proxy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Value of the `error` field in proxy error bodies.
pub const PROXY_ERROR: &str = "Proxy Error";

/// JSON body returned when the upstream could not be reached.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProxyErrorBody {
    pub error: &'static str,
    pub message: String,
    /// URL as requested by the client (path + query, prefix included).
    pub url: String,
    /// Upstream origin.
    pub target: String,
}

/// Every way the proxy pipeline can fail before a response is produced.
#[derive(Debug)]
pub enum ProxyFailure {
    /// Connect, TLS, send failure or timeout.
    Upstream {
        message: String,
        url: String,
        target: String,
    },
    /// Upstream started answering, then the body stream broke.
    ResponseStream,
    /// Inbound body above the configured limit.
    BodyTooLarge { limit: usize },
    /// Inbound body could not be read.
    BodyUnreadable,
}

impl IntoResponse for ProxyFailure {
    fn into_response(self) -> Response {
        match self {
            ProxyFailure::Upstream {
                message,
                url,
                target,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProxyErrorBody {
                    error: PROXY_ERROR,
                    message,
                    url,
                    target,
                }),
            )
                .into_response(),
            ProxyFailure::ResponseStream => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Proxy response error").into_response()
            }
            ProxyFailure::BodyTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Request body exceeds {limit} bytes"),
            )
                .into_response(),
            ProxyFailure::BodyUnreadable => {
                (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
            }
        }
    }
}
