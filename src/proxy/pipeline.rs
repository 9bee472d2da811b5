//! The per-request proxy pipeline.
//!
//! ```text
//! RECEIVED → FORWARDED_UPSTREAM ─┬→ BODY_BUFFERED → REWRITTEN | UNCHANGED
//!                                │      → HEADERS_NORMALIZED → SENT
//!                                └→ UPSTREAM_ERROR → ERROR_SENT
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;
use crate::http::request::request_id;
use crate::http::response::ProxyFailure;
use crate::observability::metrics::record_rewrite;
use crate::proxy::forward::{UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse};
use crate::proxy::origin::OriginResolver;
use crate::proxy::rewrite::{OriginRewriter, RewriteError, RewriteGate, Rewritten};
use crate::routing::{ProxyRouter, RouteMatch};
use crate::security::cors;
use crate::security::headers::{normalize_framing, strip_hop_by_hop};
use crate::security::limits::{read_limited, BodyLimitError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid upstream target {target:?}: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Everything needed to proxy one request; shared read-only across requests.
#[derive(Debug, Clone)]
pub struct ProxyPipeline {
    router: ProxyRouter,
    upstream: UpstreamClient,
    gate: RewriteGate,
    rewriter: OriginRewriter,
    origins: OriginResolver,
    max_body_size: usize,
}

impl ProxyPipeline {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, PipelineError> {
        let target = Url::parse(&config.proxy.target).map_err(|source| PipelineError::InvalidTarget {
            target: config.proxy.target.clone(),
            source,
        })?;

        Ok(Self {
            router: ProxyRouter::new(config.proxy.path.clone()),
            upstream: UpstreamClient::new(&target, &config.timeouts)?,
            gate: RewriteGate::new()?,
            rewriter: OriginRewriter::new(&target)?,
            origins: OriginResolver::new(
                config.proxy.public_domain.as_deref(),
                config.listener.tls.enabled,
            ),
            max_body_size: config.limits.max_body_size,
        })
    }

    /// Proxy prefix, e.g. `/pg`.
    pub fn prefix(&self) -> &str {
        self.router.prefix()
    }

    /// Upstream origin, e.g. `https://dhamendemo.elm.sa`.
    pub fn target(&self) -> &str {
        self.upstream.origin()
    }

    pub fn route(&self, request: &Request) -> RouteMatch {
        self.router.match_uri(request.uri())
    }

    /// Answer a CORS preflight locally.
    pub fn preflight(&self, request_headers: &HeaderMap, uri: &Uri) -> Response {
        let public_origin = self.origins.resolve(request_headers, uri);
        let allow_origin = cors::allow_origin(request_headers, &public_origin);

        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        *response.headers_mut() = cors::preflight_headers(request_headers, allow_origin);
        response
    }

    /// Forward `request` upstream under `upstream_path` and post-process the answer.
    pub async fn forward(&self, request: Request, upstream_path: String) -> Response {
        let (parts, body) = request.into_parts();
        let request_id = request_id(&parts.headers).to_string();
        let original_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let public_origin = self.origins.resolve(&parts.headers, &parts.uri);
        let allow_origin = cors::allow_origin(&parts.headers, &public_origin);

        let body = match read_limited(&parts.headers, body, self.max_body_size).await {
            Ok(body) => body,
            Err(BodyLimitError::TooLarge { limit }) => {
                tracing::warn!(request_id = %request_id, url = %original_url, limit, "Request body too large");
                return with_cors(ProxyFailure::BodyTooLarge { limit }, allow_origin);
            }
            Err(err) => {
                tracing::warn!(request_id = %request_id, url = %original_url, error = %err, "Unreadable request body");
                return with_cors(ProxyFailure::BodyUnreadable, allow_origin);
            }
        };

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            url = %original_url,
            upstream = %self.upstream.url_for(&upstream_path),
            "Forwarding upstream"
        );

        let upstream_request = UpstreamRequest {
            method: parts.method.clone(),
            path_and_query: upstream_path,
            headers: parts.headers.clone(),
            body,
        };

        let upstream = match self.upstream.send(upstream_request).await {
            Ok(response) => response,
            Err(err) if err.is_body_error() => {
                tracing::error!(request_id = %request_id, url = %original_url, error = %err, "Proxy response error");
                return with_cors(ProxyFailure::ResponseStream, allow_origin);
            }
            Err(err) => {
                tracing::error!(
                    request_id = %request_id,
                    url = %original_url,
                    target = %self.target(),
                    error = %err,
                    "Proxy error"
                );
                let failure = ProxyFailure::Upstream {
                    message: err.to_string(),
                    url: original_url,
                    target: self.target().to_string(),
                };
                return with_cors(failure, allow_origin);
            }
        };

        let UpstreamResponse {
            status,
            mut headers,
            body,
        } = upstream;
        strip_hop_by_hop(&mut headers);

        let (body, rewritten) = self.maybe_rewrite(&request_id, parts.uri.path(), &headers, body, &public_origin);
        if rewritten {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.remove(header::ETAG);
        }

        cors::apply_cors_headers(&mut headers, allow_origin);
        normalize_framing(&mut headers, &parts.method, status, body.len());

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    /// Run the rewrite gate and rewriter; any failure keeps the original body.
    fn maybe_rewrite(
        &self,
        request_id: &str,
        request_path: &str,
        headers: &HeaderMap,
        body: Bytes,
        public_origin: &str,
    ) -> (Bytes, bool) {
        let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
        if !self.gate.should_rewrite(content_type, request_path) {
            return (body, false);
        }

        let replacement = format!("{}{}", public_origin, self.prefix());
        match self.rewriter.rewrite(&body, &replacement) {
            Ok(Rewritten::Changed { body, replacements }) => {
                tracing::debug!(request_id = %request_id, path = %request_path, replacements, "Rewrote upstream origin");
                record_rewrite("changed");
                (body, true)
            }
            Ok(Rewritten::Unchanged) => {
                record_rewrite("unchanged");
                (body, false)
            }
            Err(err) => {
                tracing::warn!(request_id = %request_id, path = %request_path, error = %err, "Failed to rewrite response body");
                record_rewrite("failed");
                (body, false)
            }
        }
    }
}

/// Failure response with the CORS set applied.
fn with_cors(failure: ProxyFailure, allow_origin: Option<HeaderValue>) -> Response {
    let mut response = failure.into_response();
    cors::apply_cors_headers(response.headers_mut(), allow_origin);
    response
}
