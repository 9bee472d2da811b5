//! Public origin resolution.
//!
//! Resolution order, evaluated once per request:
//! 1. configured `public_domain` override
//! 2. `X-Forwarded-Host` / `X-Forwarded-Proto`
//! 3. `Host` header, else the request URI authority (HTTP/2 `:authority`);
//!    scheme from the URI if absolute, else the listener's TLS state
//!
//! A bare-host override still takes its scheme from steps 2/3.

use axum::http::{header, HeaderMap, Uri};

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Debug, Clone, PartialEq, Eq)]
enum PublicOverride {
    /// Full origin such as `https://poc.example.com`.
    Origin(String),
    /// Host (optionally with port) without a scheme.
    Host(String),
}

/// Resolves the origin clients use to reach the proxy.
#[derive(Debug, Clone)]
pub struct OriginResolver {
    public_override: Option<PublicOverride>,
    tls: bool,
}

impl OriginResolver {
    pub fn new(public_domain: Option<&str>, tls: bool) -> Self {
        let public_override = public_domain
            .map(|d| d.trim().trim_end_matches('/'))
            .filter(|d| !d.is_empty())
            .map(|d| {
                if d.contains("://") {
                    PublicOverride::Origin(d.to_string())
                } else {
                    PublicOverride::Host(d.to_string())
                }
            });
        Self { public_override, tls }
    }

    /// `scheme://host[:port]` without a trailing slash.
    pub fn resolve(&self, headers: &HeaderMap, uri: &Uri) -> String {
        if let Some(PublicOverride::Origin(origin)) = &self.public_override {
            return origin.clone();
        }

        let scheme = first_value(headers, X_FORWARDED_PROTO)
            .map(|p| p.to_ascii_lowercase())
            .filter(|p| p == "http" || p == "https")
            .or_else(|| {
                uri.scheme_str()
                    .map(str::to_ascii_lowercase)
                    .filter(|s| s == "http" || s == "https")
            })
            .unwrap_or_else(|| (if self.tls { "https" } else { "http" }).to_string());

        let host = match &self.public_override {
            Some(PublicOverride::Host(host)) => host.clone(),
            _ => first_value(headers, X_FORWARDED_HOST)
                .or_else(|| first_value(headers, header::HOST.as_str()))
                .or_else(|| uri.authority().map(|a| a.as_str()))
                .unwrap_or("localhost")
                .to_string(),
        };

        format!("{scheme}://{host}")
    }
}

/// First comma-separated entry of a header, trimmed, if non-empty.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
