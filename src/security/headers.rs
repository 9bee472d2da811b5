//! Header manipulation between client and upstream.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Prepare forwarded request headers (identity encoding, upstream Host)
//! - Fix response framing after the body has been buffered or rewritten

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// Headers that describe a single connection and never cross a proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Build the header map sent upstream from the inbound request headers.
///
/// `Host` and `Content-Length` are left to the client, and compression is
/// disabled so the response body can be rewritten as text.
pub fn forwarded_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    headers
}

/// Drop encoding/chunking headers and set `Content-Length` to the final size.
///
/// HEAD and 304 responses keep the upstream length since they carry no body;
/// 1xx and 204 responses must not carry one at all.
pub fn normalize_framing(headers: &mut HeaderMap, method: &Method, status: StatusCode, len: usize) {
    headers.remove(header::CONTENT_ENCODING);
    headers.remove(header::TRANSFER_ENCODING);

    if *method == Method::HEAD || status == StatusCode::NOT_MODIFIED {
        return;
    }
    if status.is_informational() || status == StatusCode::NO_CONTENT {
        headers.remove(header::CONTENT_LENGTH);
        return;
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
}
