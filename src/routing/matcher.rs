//! Path prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix only matches on a segment boundary: `/pg` matches `/pg` and
//!   `/pg/x`, never `/pgx`
//! - No regex to guarantee O(n) matching

/// Matches and strips the configured proxy prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. Trailing slashes are ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_string();
        Self { prefix }
    }

    /// The normalized prefix, e.g. `/pg`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if the path is routed by this prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// Remove the prefix once. An exact match yields `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}
