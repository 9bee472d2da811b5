//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, request counters)
//! - Dispatch requests to the proxy pipeline or the static file server
//! - Serve over plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware,
    response::Response,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics::{track_requests, ProxyStats};
use crate::proxy::{PipelineError, ProxyPipeline};
use crate::routing::RouteMatch;
use crate::status::setup_status_router;

/// How long in-flight TLS connections may drain after shutdown is requested.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ProxyPipeline>,
    pub stats: Arc<ProxyStats>,
    pub static_files: ServeDir,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    stats: Arc<ProxyStats>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, PipelineError> {
        let pipeline = Arc::new(ProxyPipeline::from_config(&config)?);
        let stats = Arc::new(ProxyStats::new());

        let state = AppState {
            pipeline,
            stats: Arc::clone(&stats),
            static_files: ServeDir::new(&config.static_files.root),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            stats,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let stats = Arc::clone(&state.stats);

        setup_status_router()
            .fallback(dispatch)
            .with_state(state)
            .layer(middleware::from_fn_with_state(stats, track_requests))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request.headers()),
                    )
                }),
            )
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Request counters shared with `/metrics`.
    pub fn stats(&self) -> Arc<ProxyStats> {
        Arc::clone(&self.stats)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve plain HTTP until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy_path = %self.config.proxy.path,
            target = %self.config.proxy.target,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            proxy_path = %self.config.proxy.path,
            target = %self.config.proxy.target,
            "HTTPS server starting"
        );

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Everything that is not `/health` or `/metrics`.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    match state.pipeline.route(&request) {
        RouteMatch::Proxy { upstream_path } => {
            if request.method() == Method::OPTIONS {
                tracing::debug!(path = %request.uri().path(), "Answering CORS preflight");
                return state.pipeline.preflight(request.headers(), request.uri());
            }
            state.pipeline.forward(request, upstream_path).await
        }
        RouteMatch::Static => serve_static(state.static_files, request).await,
    }
}

async fn serve_static(files: ServeDir, request: Request) -> Response {
    match files.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
