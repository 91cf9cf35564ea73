//! Prometheus metrics for monitoring game server health and activity.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener,
//! enabled by setting `METRICS_BIND`.

#![allow(dead_code)] // Public API for future integration

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Record HTTP request with method, path and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment games created counter, labelled by game type.
pub fn games_created_total(game_type: &str) {
    metrics::counter!("games_created_total",
        "game_type" => game_type.to_string()
    )
    .increment(1);
}

/// Increment games finished counter, labelled by game type.
pub fn games_finished_total(game_type: &str) {
    metrics::counter!("games_finished_total",
        "game_type" => game_type.to_string()
    )
    .increment(1);
}

/// Increment moves counter, labelled by action.
pub fn moves_total(action: &str) {
    metrics::counter!("moves_total",
        "action" => action.to_string()
    )
    .increment(1);
}

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}
