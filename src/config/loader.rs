//! Configuration loading from disk and environment.
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML
//! file, then environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::validation::{validate_config, ValidationErrors};

/// Environment variable naming the optional TOML file.
pub const CONFIG_PATH_ENV: &str = "PROXY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {var}: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
}

/// Load configuration from the process environment and an optional file,
/// then validate it.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let env = |key: &str| std::env::var(key).ok();
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| env(CONFIG_PATH_ENV).map(PathBuf::from));
    load_config_with(path.as_deref(), env)
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    normalize(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay environment variables onto `config`.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TARGET_URL") {
        config.proxy.target = v;
    }
    if let Some(v) = get("PROXY_PATH") {
        config.proxy.path = v;
    }
    if let Some(v) = get("PUBLIC_DOMAIN") {
        config.proxy.public_domain = Some(v);
    }
    if let Some(v) = get("HOST") {
        config.listener.host = v;
    }
    if let Some(v) = get("PORT") {
        config.listener.port = parse_var("PORT", v)?;
    }
    if let Some(v) = get("USE_HTTPS") {
        config.listener.tls.enabled = parse_flag("USE_HTTPS", v)?;
    }
    if let Some(v) = get("SSL_CERT_PATH") {
        config.listener.tls.cert_path = PathBuf::from(v);
    }
    if let Some(v) = get("SSL_KEY_PATH") {
        config.listener.tls.key_path = PathBuf::from(v);
    }
    if let Some(v) = get("STATIC_ROOT") {
        config.static_files.root = PathBuf::from(v);
    }
    if let Some(v) = get("UPSTREAM_TIMEOUT_SECS") {
        config.timeouts.upstream_secs = parse_var("UPSTREAM_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = get("CONNECT_TIMEOUT_SECS") {
        config.timeouts.connect_secs = parse_var("CONNECT_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = get("MAX_BODY_SIZE") {
        config.limits.max_body_size = parse_var("MAX_BODY_SIZE", v)?;
    }
    if let Some(v) = get("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = get("LOG_FORMAT") {
        config.observability.log_format = match v.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::Env {
                    var: "LOG_FORMAT",
                    value: v,
                    reason: "expected \"pretty\" or \"json\"".to_string(),
                })
            }
        };
    }
    if let Some(v) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(v);
    }

    Ok(())
}

/// Trim trailing slashes so "/pg/" and "/pg" behave the same.
fn normalize(config: &mut ProxyConfig) {
    let trimmed = config.proxy.path.trim().trim_end_matches('/');
    config.proxy.path = trimmed.to_string();

    let target = config.proxy.target.trim().trim_end_matches('/');
    config.proxy.target = target.to_string();

    if let Some(domain) = config.proxy.public_domain.take() {
        let domain = domain.trim().trim_end_matches('/');
        if !domain.is_empty() {
            config.proxy.public_domain = Some(domain.to_string());
        }
    }
}

fn parse_var<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
        value,
    })
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = load_config_with(None, env_from(&[])).unwrap();
        assert_eq!(config.proxy.path, "/pg");
        assert_eq!(config.listener.port, 8080);
    }

    #[test]
    fn env_overrides_apply() {
        let config = load_config_with(
            None,
            env_from(&[
                ("TARGET_URL", "https://upstream.example.org/"),
                ("PROXY_PATH", "/widget/"),
                ("PUBLIC_DOMAIN", "poc.example.com"),
                ("PORT", "9443"),
                ("USE_HTTPS", "yes"),
                ("LOG_FORMAT", "JSON"),
            ]),
        )
        .unwrap();

        assert_eq!(config.proxy.target, "https://upstream.example.org");
        assert_eq!(config.proxy.path, "/widget");
        assert_eq!(config.proxy.public_domain.as_deref(), Some("poc.example.com"));
        assert_eq!(config.listener.port, 9443);
        assert!(config.listener.tls.enabled);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = load_config_with(None, env_from(&[("PUBLIC_DOMAIN", "  ")])).unwrap();
        assert!(config.proxy.public_domain.is_none());
    }

    #[test]
    fn bad_port_is_reported() {
        let err = load_config_with(None, env_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn bad_flag_is_reported() {
        let err = load_config_with(None, env_from(&[("USE_HTTPS", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "USE_HTTPS", .. }));
    }

    #[test]
    fn invalid_target_fails_validation() {
        let err = load_config_with(None, env_from(&[("TARGET_URL", "ftp://nope")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn file_then_env() {
        let dir = std::env::temp_dir().join(format!("orp-loader-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("proxy.toml");
        fs::write(
            &path,
            r#"
            [proxy]
            target = "http://127.0.0.1:9000"
            path = "/from-file"

            [listener]
            port = 7000
            "#,
        )
        .unwrap();

        let config = load_config_with(Some(&path), env_from(&[("PORT", "7001")])).unwrap();
        assert_eq!(config.proxy.target, "http://127.0.0.1:9000");
        assert_eq!(config.proxy.path, "/from-file");
        assert_eq!(config.listener.port, 7001);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config_with(Some(Path::new("/definitely/not/here.toml")), env_from(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
