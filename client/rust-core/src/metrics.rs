use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // Backend API Metrics
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "api_requests_total",
        "Total number of backend API requests",
        &["endpoint", "status"]
    )
    .unwrap();

    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "api_request_duration_seconds",
        "Backend API request duration in seconds",
        &["endpoint"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    pub static ref DEGRADED_FETCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "degraded_fetches_total",
        "Fetches that fell back to placeholder data",
        &["resource"]
    )
    .unwrap();

    // Aggregation Metrics
    pub static ref AGGREGATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "aggregations_total",
        "Total number of aggregation runs",
        &["kind"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: time a backend request and count it by outcome
pub async fn track_api_request<F, T, E>(endpoint: &str, future: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    API_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status])
        .inc();

    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(duration);

    result
}

/// Record a fetch that fell back to placeholder data
pub fn record_degraded_fetch(resource: &str) {
    DEGRADED_FETCHES_TOTAL.with_label_values(&[resource]).inc();
}
