//! Upstream forwarding.
//!
//! One attempt per client request. The whole exchange (connect, headers,
//! body) runs under a single deadline; if the client goes away the handler
//! future is dropped and the in-flight upstream request with it.

use std::error::Error as StdError;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::config::TimeoutConfig;
use crate::resilience::with_deadline;
use crate::security::headers::forwarded_request_headers;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    /// Connect/TLS/send failure before response headers arrived.
    #[error("{}", error_chain(.0))]
    Transport(#[source] reqwest::Error),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    /// Response headers arrived but the body stream failed.
    #[error("upstream body stream failed: {}", error_chain(.0))]
    Body(#[source] reqwest::Error),
}

impl UpstreamError {
    /// True for failures that happened after the upstream started answering.
    pub fn is_body_error(&self) -> bool {
        matches!(self, UpstreamError::Body(_))
    }
}

/// Request as it will be sent upstream.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path and query relative to the upstream origin, starting with `/`.
    pub path_and_query: String,
    /// Inbound headers, before hop-by-hop stripping.
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Fully buffered upstream response.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HTTP(S) client bound to the fixed upstream origin.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    origin: String,
    deadline: Duration,
}

impl UpstreamClient {
    pub fn new(target: &Url, timeouts: &TimeoutConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(UpstreamError::Build)?;

        Ok(Self {
            client,
            origin: target.origin().ascii_serialization(),
            deadline: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// Upstream origin without trailing slash, e.g. `https://dhamendemo.elm.sa`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Absolute upstream URL for a stripped path.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin, path_and_query)
    }

    /// Send the request and buffer the whole response body.
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url_for(&request.path_and_query);
        let headers = forwarded_request_headers(&request.headers);

        let mut builder = self.client.request(request.method, url).headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let exchange = async move {
            let response = builder.send().await.map_err(UpstreamError::Transport)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(UpstreamError::Body)?;
            Ok::<_, UpstreamError>(UpstreamResponse {
                status,
                headers,
                body,
            })
        };

        with_deadline(self.deadline, exchange)
            .await
            .map_err(|elapsed| UpstreamError::Timeout(elapsed.0))?
    }
}

/// `outer: inner: root` rendering of an error and its sources.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
