//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Active gateway connection gauges
//! - Live session activity (joins, pings, leaves, credited watch time)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "live_classroom";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Active gateway connections gauge
pub static GATEWAY_CONNECTIONS_ACTIVE: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new(
            "gateway_connections_active",
            "Number of active gateway WebSocket connections",
        )
        .namespace(NAMESPACE),
        &["state"], // "connected", "identified"
    )
    .expect("Failed to create GATEWAY_CONNECTIONS_ACTIVE metric")
});

/// Attendance events by kind ("join", "ping", "leave")
pub static LIVE_ATTENDANCE_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "live_attendance_events_total",
            "Attendance events processed for live sessions",
        )
        .namespace(NAMESPACE),
        &["event"],
    )
    .expect("Failed to create LIVE_ATTENDANCE_EVENTS_TOTAL metric")
});

/// Watch time credited to participants, in milliseconds
pub static LIVE_WATCH_TIME_CREDITED_MS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "live_watch_time_credited_ms_total",
            "Watch time credited to participants in milliseconds",
        )
        .namespace(NAMESPACE),
        &["source"], // "ping", "leave"
    )
    .expect("Failed to create LIVE_WATCH_TIME_CREDITED_MS metric")
});

/// Sessions currently LIVE on this instance
pub static LIVE_SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("live_sessions_active", "Number of sessions currently live").namespace(NAMESPACE),
    )
    .expect("Failed to create LIVE_SESSIONS_ACTIVE metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(GATEWAY_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register GATEWAY_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(LIVE_ATTENDANCE_EVENTS_TOTAL.clone()))
        .expect("Failed to register LIVE_ATTENDANCE_EVENTS_TOTAL");
    registry
        .register(Box::new(LIVE_WATCH_TIME_CREDITED_MS.clone()))
        .expect("Failed to register LIVE_WATCH_TIME_CREDITED_MS");
    registry
        .register(Box::new(LIVE_SESSIONS_ACTIVE.clone()))
        .expect("Failed to register LIVE_SESSIONS_ACTIVE");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record an attendance event and the watch time it credited
pub fn record_attendance(event: &str, credited_ms: i64) {
    LIVE_ATTENDANCE_EVENTS_TOTAL.with_label_values(&[event]).inc();
    if credited_ms > 0 {
        LIVE_WATCH_TIME_CREDITED_MS
            .with_label_values(&[event])
            .inc_by(credited_ms as u64);
    }
}

/// Helper to update gateway connection counts
pub fn set_gateway_connections(connected: i64, identified: i64) {
    GATEWAY_CONNECTIONS_ACTIVE
        .with_label_values(&["connected"])
        .set(connected as f64);
    GATEWAY_CONNECTIONS_ACTIVE
        .with_label_values(&["identified"])
        .set(identified as f64);
}

/// Helper to track sessions going live and ending
pub fn live_session_started() {
    LIVE_SESSIONS_ACTIVE.inc();
}

pub fn live_session_ended() {
    LIVE_SESSIONS_ACTIVE.dec();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics() {
        let _ = &*REGISTRY;
        record_http_request("GET", "/health", 200, 0.001);
        let metrics = gather_metrics();
        assert!(metrics.contains("live_classroom_http_requests_total"));
    }

    #[test]
    fn test_record_attendance() {
        let _ = &*REGISTRY;
        record_attendance("ping", 30_000);
        record_attendance("join", 0);
        let metrics = gather_metrics();
        assert!(metrics.contains("live_classroom_live_attendance_events_total"));
        assert!(metrics.contains("live_classroom_live_watch_time_credited_ms_total"));
    }
}
