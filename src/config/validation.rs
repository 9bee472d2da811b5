//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream origin and proxy prefix shape
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), ValidationErrors>
//! - Runs before config is accepted into the system
//! - TLS file existence is a startup concern, not checked here

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// Paths served locally that the proxy prefix must not shadow.
const RESERVED_PATHS: &[&str] = &["/health", "/metrics"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("proxy.target {0:?} is not an absolute http(s) URL")]
    InvalidTarget(String),

    #[error("proxy.target {0:?} must be an origin without a path, query or fragment")]
    TargetHasPath(String),

    #[error("proxy.path {0:?} must start with '/' and must not be '/'")]
    InvalidPrefix(String),

    #[error("proxy.path {0:?} collides with a built-in endpoint")]
    ReservedPrefix(String),

    #[error("proxy.public_domain {0:?} is not a valid host or origin")]
    InvalidPublicDomain(String),

    #[error("listener.port must be non-zero")]
    ZeroPort,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Every problem found in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    match Url::parse(&config.proxy.target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::TargetHasPath(config.proxy.target.clone()));
            }
        }
        _ => errors.push(ValidationError::InvalidTarget(config.proxy.target.clone())),
    }

    let prefix = config.proxy.path.as_str();
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::InvalidPrefix(prefix.to_string()));
    } else if RESERVED_PATHS
        .iter()
        .any(|reserved| *reserved == prefix || reserved.starts_with(&format!("{prefix}/")))
    {
        errors.push(ValidationError::ReservedPrefix(prefix.to_string()));
    }

    if let Some(domain) = &config.proxy.public_domain {
        if !public_domain_is_valid(domain) {
            errors.push(ValidationError::InvalidPublicDomain(domain.clone()));
        }
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn public_domain_is_valid(domain: &str) -> bool {
    if domain.contains("://") {
        return Url::parse(domain)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false);
    }
    !domain.is_empty() && !domain.contains('/') && !domain.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.proxy.target = "not a url".into();
        config.proxy.path = "pg".into();
        config.listener.port = 0;
        config.timeouts.upstream_secs = 0;

        let errors = validate_config(&config).unwrap_err().0;
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidTarget("not a url".into()),
                ValidationError::InvalidPrefix("pg".into()),
                ValidationError::ZeroPort,
                ValidationError::ZeroTimeout("upstream_secs"),
            ]
        );
    }

    #[test]
    fn root_prefix_rejected() {
        let mut config = ProxyConfig::default();
        config.proxy.path = "/".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn reserved_prefix_rejected() {
        let mut config = ProxyConfig::default();
        config.proxy.path = "/health".into();
        let errors = validate_config(&config).unwrap_err().0;
        assert_eq!(errors, vec![ValidationError::ReservedPrefix("/health".into())]);
    }

    #[test]
    fn target_with_path_rejected() {
        let mut config = ProxyConfig::default();
        config.proxy.target = "https://dhamendemo.elm.sa/api".into();
        let errors = validate_config(&config).unwrap_err().0;
        assert!(matches!(errors[0], ValidationError::TargetHasPath(_)));
    }

    #[test]
    fn public_domain_forms() {
        assert!(public_domain_is_valid("poc.example.com"));
        assert!(public_domain_is_valid("poc.example.com:8443"));
        assert!(public_domain_is_valid("https://poc.example.com"));
        assert!(!public_domain_is_valid("poc.example.com/pg"));
        assert!(!public_domain_is_valid("ftp://poc.example.com"));
    }
}
