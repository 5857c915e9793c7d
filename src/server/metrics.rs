use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Prefix shared by every metric the portal exports
const PREFIX: &str = "videoportal";

lazy_static! {
    // Shared registry, gathered by the metrics endpoint
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "HTTP requests by method, path and status"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "Handler latency in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Upstream Metrics (CRM token endpoints, CRM query API, video host)
    pub static ref UPSTREAM_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_upstream_requests_total"), "Upstream requests by service and outcome"),
        &["service", "outcome"]
    ).expect("Failed to create upstream_requests_total metric");

    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_upstream_request_duration_seconds"),
            "Upstream request duration in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["service"]
    ).expect("Failed to create upstream_request_duration_seconds metric");

    // Catalog Metrics
    pub static ref CATALOG_VIDEOS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_videos_total"),
        "Videos in the current catalog snapshot"
    ).expect("Failed to create catalog_videos_total metric");

    pub static ref CATALOG_SKIPPED_RECORDS: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_skipped_records"),
        "CRM records skipped during the last catalog assembly"
    ).expect("Failed to create catalog_skipped_records metric");

    pub static ref CATALOG_REFRESHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_catalog_refreshes_total"), "Catalog assemblies by outcome"),
        &["outcome"]
    ).expect("Failed to create catalog_refreshes_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Errors by type and the surface that reported them"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Resident set size in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Register every metric with the shared registry.
pub fn init_metrics() {
    // Repeat registration is harmless, tests call this more than once.
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_VIDEOS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_SKIPPED_RECORDS.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_REFRESHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics registered");
}

/// Count one handled request and observe its latency.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record one upstream call. `outcome` is one of success, error,
/// transport_error, auth_rejected.
pub fn record_upstream_request(service: &str, outcome: &str, duration: Duration) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[service, outcome])
        .inc();

    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[service])
        .observe(duration.as_secs_f64());
}

/// Record a catalog assembly attempt
pub fn record_catalog_refresh(outcome: &str) {
    CATALOG_REFRESHES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Update the catalog size gauges after a successful assembly
pub fn set_catalog_size(videos: usize, skipped_records: usize) {
    CATALOG_VIDEOS_TOTAL.set(videos as f64);
    CATALOG_SKIPPED_RECORDS.set(skipped_records as f64);
}

/// Count one typed error against the surface that reported it.
pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Refresh the memory gauge from procfs.
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // VmRSS is reported in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }

    // Non-Linux systems just keep the stale value
}

/// Text-format dump served on the metrics port.
pub async fn metrics_handler() -> impl IntoResponse {
    // Take a fresh memory reading first
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
