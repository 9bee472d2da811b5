//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Decide whether a request belongs to the proxy or the static file server
//! - Compute the upstream path (prefix stripped, query preserved)
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - `/health` and `/metrics` are axum routes and never reach this lookup

use axum::http::Uri;

use crate::routing::matcher::PathPrefixMatcher;

/// Outcome of a route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// Forward to upstream using this path and query.
    Proxy { upstream_path: String },
    /// Not under the proxy prefix.
    Static,
}

/// Routes requests between the proxy pipeline and static files.
#[derive(Debug, Clone)]
pub struct ProxyRouter {
    matcher: PathPrefixMatcher,
}

impl ProxyRouter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            matcher: PathPrefixMatcher::new(prefix),
        }
    }

    /// The proxy prefix, e.g. `/pg`.
    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn match_uri(&self, uri: &Uri) -> RouteMatch {
        match self.matcher.strip(uri.path()) {
            Some(rest) => {
                let upstream_path = match uri.query() {
                    Some(query) => format!("{rest}?{query}"),
                    None => rest.to_string(),
                };
                RouteMatch::Proxy { upstream_path }
            }
            None => RouteMatch::Static,
        }
    }
}
