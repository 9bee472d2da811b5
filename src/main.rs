//! Origin-rewriting reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 ORIGIN REWRITE PROXY              │
//!                     │                                                   │
//!   Client Request    │  ┌─────────┐   ┌─────────┐   ┌──────────────┐     │
//!   ──────────────────┼─▶│   net   │──▶│  http   │──▶│   routing    │     │
//!                     │  │ tcp/tls │   │ server  │   │ prefix match │     │
//!                     │  └─────────┘   └────┬────┘   └──────┬───────┘     │
//!                     │                     │               │             │
//!                     │        /health      │      ┌────────┴────────┐    │
//!                     │        /metrics ◀───┘      ▼                 ▼    │
//!                     │                      ┌──────────┐      ┌────────┐ │
//!                     │                      │  proxy   │      │ static │ │
//!                     │                      │ pipeline │      │ files  │ │
//!                     │                      └────┬─────┘      └────────┘ │
//!                     │                           │                       │
//!   Client Response   │  ┌───────────────┐   ┌────▼─────┐                 │
//!   ◀─────────────────┼──│ rewrite, CORS │◀──│ upstream │◀────────────────┼─── Upstream
//!                     │  │   framing     │   │  client  │                 │    Origin
//!                     │  └───────────────┘   └──────────┘                 │
//!                     │                                                   │
//!                     │  config · observability · resilience · lifecycle  │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use origin_rewrite_proxy::config::load_config;
use origin_rewrite_proxy::lifecycle::{self, Shutdown};
use origin_rewrite_proxy::observability::init_tracing;

#[derive(Parser)]
#[command(name = "origin-rewrite-proxy")]
#[command(about = "Reverse proxy that rewrites upstream origins in script responses", long_about = None)]
struct Cli {
    /// TOML config file (falls back to PROXY_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address(),
        tls = config.listener.tls.enabled,
        proxy_path = %config.proxy.path,
        target = %config.proxy.target,
        public_domain = config.proxy.public_domain.as_deref().unwrap_or("-"),
        static_root = %config.static_files.root.display(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    match lifecycle::run(config, shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy failed");
            ExitCode::FAILURE
        }
    }
}
