//! Startup orchestration.
//!
//! # Responsibilities
//! - Refuse to start when TLS is on and certificate files are missing
//! - Build the proxy pipeline and HTTP server
//! - Start the optional Prometheus exporter
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener starts last (traffic only when ready)

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{load_tls_config, TlsError};
use crate::observability::metrics::init_metrics;
use crate::proxy::PipelineError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("failed to build proxy: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("invalid bind address {address}: {source}")]
    BindAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Run the proxy until `shutdown` fires.
pub async fn run(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let tls_enabled = config.listener.tls.enabled;

    // Before any socket is bound.
    let tls = if tls_enabled {
        Some(load_tls_config(&config.listener.tls).await?)
    } else {
        None
    };

    if let Some(address) = config.observability.metrics_address.as_deref() {
        match address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = init_metrics(addr) {
                    tracing::warn!(error = %e, "Prometheus exporter not started");
                }
            }
            Err(e) => tracing::warn!(
                metrics_address = %address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let addr: SocketAddr = address
                .parse()
                .map_err(|source| StartupError::BindAddress {
                    address: address.clone(),
                    source,
                })?;
            server
                .run_tls(addr, tls, shutdown.subscribe())
                .await
                .map_err(StartupError::Serve)
        }
        None => {
            let listener = TcpListener::bind(&address)
                .await
                .map_err(|source| StartupError::Bind {
                    address: address.clone(),
                    source,
                })?;
            server
                .run(listener, shutdown.subscribe())
                .await
                .map_err(StartupError::Serve)
        }
    }
}
