//! Metrics collection using Prometheus
//!
//! Tracks request outcomes, per-credential attempts and external tool
//! invocations. Exposed by the bot's HTTP server at `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder};

/// Finished requests
/// Labels: outcome (success or a DownloadError subcategory)
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "spidybot_requests_total",
        "Total number of finished download requests by outcome",
        &["outcome"]
    )
    .expect("spidybot_requests_total registers once")
});

/// Fetch/download attempt cycles
/// Labels: result (success/auth_retry/fatal)
pub static ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "spidybot_attempts_total",
        "Total number of fetch/download attempt cycles by result",
        &["result"]
    )
    .expect("spidybot_attempts_total registers once")
});

/// External tool execution duration
/// Labels: operation (metadata/download/transcode)
pub static TOOL_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "spidybot_tool_duration_seconds",
        "Time spent executing external tools",
        &["operation"],
        vec![0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 240.0, 600.0]
    )
    .expect("spidybot_tool_duration_seconds registers once")
});

/// Touch every metric so it shows up in `/metrics` with zero values
pub fn init_metrics() {
    log::info!("Initializing metrics registry...");

    REQUESTS_TOTAL.with_label_values(&["success"]);
    for result in ["success", "auth_retry", "fatal"] {
        ATTEMPTS_TOTAL.with_label_values(&[result]);
    }
    for operation in ["metadata", "download", "transcode"] {
        TOOL_DURATION_SECONDS.with_label_values(&[operation]);
    }
}

pub fn record_request(outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_attempt(result: &str) {
    ATTEMPTS_TOTAL.with_label_values(&[result]).inc();
}

pub fn observe_tool(operation: &str, seconds: f64) {
    TOOL_DURATION_SECONDS.with_label_values(&[operation]).observe(seconds);
}

/// Render all registered metrics in the Prometheus text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
