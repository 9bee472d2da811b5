//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the request/error counters served by `/metrics`
//! - Mirror them into the `metrics` facade for the optional Prometheus exporter
//! - Report process memory usage
//!
//! # Metrics
//! - `proxy_requests_total` (counter): completed requests by method, status
//! - `proxy_errors_total` (counter): completed requests with status >= 400
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_rewrites_total` (counter): rewrite outcomes (changed, unchanged, failed)
//!
//! # Design Decisions
//! - Counters are atomics owned by the server instance, not globals
//! - `/metrics` reads a snapshot; no locks anywhere

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use serde::Serialize;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Process-lifetime request statistics.
#[derive(Debug)]
pub struct ProxyStats {
    started: Instant,
    requests: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of [`ProxyStats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub uptime_secs: f64,
    pub request_count: u64,
    pub error_count: u64,
}

impl ProxyStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Count a completed response.
    pub fn record_response(&self, status: u16) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if status >= 400 {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.uptime_secs(),
            request_count: self.requests.load(Ordering::Relaxed),
            error_count: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for ProxyStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware counting every response once it has been produced.
pub async fn track_requests(
    State(stats): State<Arc<ProxyStats>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;
    let status = response.status().as_u16();

    stats.record_response(status);
    record_request(&method, status, start);

    response
}

/// Record one request in the metrics facade.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status_label = status.to_string();
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status_label.clone()
    )
    .increment(1);
    if status >= 400 {
        metrics::counter!(
            "proxy_errors_total",
            "method" => method.to_string(),
            "status" => status_label
        )
        .increment(1);
    }
    metrics::histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a body rewrite attempt.
pub fn record_rewrite(outcome: &'static str) {
    metrics::counter!("proxy_rewrites_total", "outcome" => outcome).increment(1);
}

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

/// Resident and virtual memory of this process, in bytes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MemoryUsage {
    pub rss: u64,
    #[serde(rename = "virtual")]
    pub virtual_memory: u64,
}

/// Current memory usage, if the platform exposes it.
pub fn memory_usage() -> Option<MemoryUsage> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        ProcessRefreshKind::new().with_memory(),
    );
    let process = system.process(pid)?;
    Some(MemoryUsage {
        rss: process.memory(),
        virtual_memory: process.virtual_memory(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_requests_and_errors() {
        let stats = ProxyStats::new();
        stats.record_response(200);
        stats.record_response(304);
        stats.record_response(404);
        stats.record_response(500);

        let snap = stats.snapshot();
        assert_eq!(snap.request_count, 4);
        assert_eq!(snap.error_count, 2);
        assert!(snap.uptime_secs >= 0.0);
    }

    #[test]
    fn concurrent_increments() {
        let stats = Arc::new(ProxyStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_response(500);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = stats.snapshot();
        assert_eq!(snap.request_count, 8000);
        assert_eq!(snap.error_count, 8000);
    }

    #[test]
    fn memory_usage_serializes_with_virtual_key() {
        let json = serde_json::to_value(MemoryUsage {
            rss: 1,
            virtual_memory: 2,
        })
        .unwrap();
        assert_eq!(json["rss"], 1);
        assert_eq!(json["virtual"], 2);
    }
}
