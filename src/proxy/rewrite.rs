//! Upstream origin rewriting for script responses.
//!
//! Substitution is textual: occurrences inside string literals, comments and
//! embedded JSON are rewritten as well. Bodies that are not valid UTF-8 are
//! left untouched.

use bytes::Bytes;
use regex::{NoExpand, Regex};
use thiserror::Error;
use url::Url;

/// Request path marker that forces a rewrite regardless of content type.
pub const WIDGET_MARKER: &str = "widget";

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid rewrite pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("upstream target {0:?} has no host")]
    MissingHost(String),

    #[error("body is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

/// Decides whether a response body goes through the rewriter.
#[derive(Debug, Clone)]
pub struct RewriteGate {
    script_type: Regex,
}

impl RewriteGate {
    pub fn new() -> Result<Self, RewriteError> {
        let script_type = Regex::new(r"(?i)javascript|application/ecmascript|text/.+javascript")?;
        Ok(Self { script_type })
    }

    /// Script content type, or a request path carrying the widget marker.
    pub fn should_rewrite(&self, content_type: Option<&str>, request_path: &str) -> bool {
        content_type.is_some_and(|ct| self.script_type.is_match(ct))
            || request_path.contains(WIDGET_MARKER)
    }
}

/// Result of a rewrite attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewritten {
    /// At least one occurrence was replaced.
    Changed { body: Bytes, replacements: usize },
    /// Nothing matched; forward the original bytes.
    Unchanged,
}

/// Replaces the upstream origin (either scheme) with the public proxy base.
#[derive(Debug, Clone)]
pub struct OriginRewriter {
    pattern: Regex,
}

impl OriginRewriter {
    /// Build from the upstream target URL, e.g. `https://dhamendemo.elm.sa`.
    pub fn new(target: &Url) -> Result<Self, RewriteError> {
        let host = target
            .host_str()
            .ok_or_else(|| RewriteError::MissingHost(target.to_string()))?;
        let authority = match target.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let pattern = Regex::new(&format!("https?://{}", regex::escape(&authority)))?;
        Ok(Self { pattern })
    }

    /// Replace every occurrence with `replacement` (public origin + prefix).
    pub fn rewrite(&self, body: &[u8], replacement: &str) -> Result<Rewritten, RewriteError> {
        let text = std::str::from_utf8(body)?;

        let replacements = self.pattern.find_iter(text).count();
        if replacements == 0 {
            return Ok(Rewritten::Unchanged);
        }

        let rewritten = self.pattern.replace_all(text, NoExpand(replacement));
        Ok(Rewritten::Changed {
            body: Bytes::from(rewritten.into_owned()),
            replacements,
        })
    }
}
