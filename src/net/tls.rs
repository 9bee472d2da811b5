//! TLS configuration and certificate loading.

use std::path::PathBuf;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("TLS is enabled but certificate files are missing: {}", display_paths(.0))]
    MissingFiles(Vec<PathBuf>),

    #[error("failed to load TLS certificate/key: {0}")]
    Load(#[source] std::io::Error),
}

/// Paths from the TLS config that do not exist on disk.
pub fn missing_files(config: &TlsConfig) -> Vec<PathBuf> {
    [&config.cert_path, &config.key_path]
        .into_iter()
        .filter(|path| !path.exists())
        .cloned()
        .collect()
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    let missing = missing_files(config);
    if !missing.is_empty() {
        return Err(TlsError::MissingFiles(missing));
    }

    // Both reqwest and the listener link rustls; pin the provider so the
    // server builder does not have to guess.
    let _ = rustls::crypto::ring::default_provider().install_default();

    RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(TlsError::Load)
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
