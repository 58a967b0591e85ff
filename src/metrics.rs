/// Metrics and telemetry for Octavia
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Stage cache hit/miss and stale-serve rates
/// - Upstream request outcomes and latencies
/// - Probe results

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // ========== Cache Metrics ==========

    /// Cache hits by cache type
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_hits_total",
        "Total number of cache hits",
        &["cache_type"]
    )
    .unwrap();

    /// Cache misses by cache type
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_misses_total",
        "Total number of cache misses",
        &["cache_type"]
    )
    .unwrap();

    /// Cached copies served after an upstream failure
    pub static ref STALE_SERVES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "stage_stale_serves_total",
        "Total number of stale stage copies served",
        &["reason"]
    )
    .unwrap();

    // ========== Upstream Metrics ==========

    /// Upstream requests by region and outcome
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upstream_requests_total",
        "Total number of upstream stage requests",
        &["region", "outcome"]
    )
    .unwrap();

    /// Upstream request duration in seconds
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "upstream_request_duration_seconds",
        "Upstream stage request latencies in seconds",
        &["region"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0]
    )
    .unwrap();

    // ========== Probe Metrics ==========

    /// Probe executions by target and status
    pub static ref PROBES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "probes_total",
        "Total number of scheduled probe executions",
        &["probe", "status"]
    )
    .unwrap();

    /// Probe round-trip duration in seconds
    pub static ref PROBE_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "probe_duration_seconds",
        "Scheduled probe latencies in seconds",
        &["probe"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a cache access
pub fn record_cache_access(cache_type: &str, hit: bool) {
    if hit {
        CACHE_HITS_TOTAL.with_label_values(&[cache_type]).inc();
    } else {
        CACHE_MISSES_TOTAL.with_label_values(&[cache_type]).inc();
    }
}

/// Record a stale stage serve
pub fn record_stale_serve(reason: &str) {
    STALE_SERVES_TOTAL.with_label_values(&[reason]).inc();
}

/// Record an upstream request
pub fn record_upstream_request(region: &str, outcome: &str, duration: f64) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[region, outcome])
        .inc();
    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[region])
        .observe(duration);
}

/// Record a probe execution
pub fn record_probe(probe: &str, success: bool, duration: f64) {
    let status = if success { "success" } else { "failure" };
    PROBES_TOTAL.with_label_values(&[probe, status]).inc();
    PROBE_DURATION_SECONDS
        .with_label_values(&[probe])
        .observe(duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_metrics() {
        record_cache_access("stage", true);
        record_probe("cn_gf01:1", false, 0.2);

        let text = render_metrics();
        assert!(text.contains("cache_hits_total"));
        assert!(text.contains("probes_total"));
        assert!(text.contains("probe_duration_seconds"));
    }
}
