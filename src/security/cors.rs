//! Permissive CORS for proxied responses and preflights.
//!
//! The allowed origin echoes the caller's `Origin` so credentialed requests
//! work from any page embedding the widget.

use axum::http::{header, HeaderMap, HeaderValue};

pub const EXPOSE_HEADERS: &str = "Content-Type, Authorization";
pub const ALLOW_METHODS: &str = "GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS";
pub const DEFAULT_ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";
pub const PREFLIGHT_MAX_AGE_SECS: u32 = 600;

/// `Access-Control-Allow-Origin` value: the request `Origin` if present,
/// else the resolved public origin. `None` when neither is a valid header
/// value; never `*` because credentials are allowed.
pub fn allow_origin(request_headers: &HeaderMap, public_origin: &str) -> Option<HeaderValue> {
    if let Some(origin) = request_headers.get(header::ORIGIN) {
        return Some(origin.clone());
    }
    HeaderValue::from_str(public_origin).ok()
}

/// Add the CORS set to a response and merge `Origin` into `Vary`.
pub fn apply_cors_headers(headers: &mut HeaderMap, allow_origin: Option<HeaderValue>) {
    match allow_origin {
        Some(origin) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        None => {
            headers.remove(header::ACCESS_CONTROL_ALLOW_ORIGIN);
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );

    let vary = merge_vary(headers);
    headers.insert(header::VARY, vary);
}

/// Headers for a locally answered `OPTIONS` request.
pub fn preflight_headers(request_headers: &HeaderMap, allow_origin: Option<HeaderValue>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    apply_cors_headers(&mut headers, allow_origin);

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    let allow_headers = request_headers
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOW_HEADERS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(PREFLIGHT_MAX_AGE_SECS),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    headers
}

/// Existing `Vary` entries (all header lines) plus `Origin`, comma-joined.
fn merge_vary(headers: &HeaderMap) -> HeaderValue {
    let mut entries: Vec<&str> = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    if !entries.iter().any(|v| v.eq_ignore_ascii_case("origin") || *v == "*") {
        entries.push("Origin");
    }

    HeaderValue::from_str(&entries.join(", ")).unwrap_or_else(|_| HeaderValue::from_static("Origin"))
}
