//! Observability metrics
//!
//! Prometheus metrics for scoring outcomes, sessions, and latencies.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder
///
/// Must be called once at startup before recording any metrics.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    register_default_metrics();

    METRICS_HANDLE.get_or_init(|| handle.clone());
    handle
}

/// Get the global metrics handle
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Register default application metrics
fn register_default_metrics() {
    gauge!("lingua_tutor_sessions_active").set(0.0);
    counter!("lingua_tutor_sessions_created_total").absolute(0);

    counter!("lingua_tutor_scored_total", "path" => "model").absolute(0);
    counter!("lingua_tutor_scored_total", "path" => "fallback").absolute(0);
    counter!("lingua_tutor_scoring_unavailable_total").absolute(0);

    counter!("lingua_tutor_attempts_total", "outcome" => "passed").absolute(0);
    counter!("lingua_tutor_attempts_total", "outcome" => "failed").absolute(0);

    histogram!("lingua_tutor_score_duration_seconds").record(0.0);
    histogram!("lingua_tutor_stt_duration_seconds").record(0.0);
    histogram!("lingua_tutor_tts_duration_seconds").record(0.0);
}

/// Record a session creation
pub fn record_session_created() {
    counter!("lingua_tutor_sessions_created_total").increment(1);
}

/// Record the active session gauge
pub fn record_active_sessions(count: usize) {
    gauge!("lingua_tutor_sessions_active").set(count as f64);
}

/// Record a dialogue attempt outcome
pub fn record_attempt(passed: bool) {
    let outcome = if passed { "passed" } else { "failed" };
    counter!("lingua_tutor_attempts_total", "outcome" => outcome).increment(1);
}

/// Record scoring latency
pub fn record_score_latency(duration_secs: f64) {
    histogram!("lingua_tutor_score_duration_seconds").record(duration_secs);
}

/// Record STT latency
pub fn record_stt_latency(duration_secs: f64) {
    histogram!("lingua_tutor_stt_duration_seconds").record(duration_secs);
}

/// Record TTS latency
pub fn record_tts_latency(duration_secs: f64) {
    histogram!("lingua_tutor_tts_duration_seconds").record(duration_secs);
}
