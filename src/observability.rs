use std::net::SocketAddr;

use crate::model::ValidationResult;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total requests handled. Labels: command, status.
pub const REQUESTS_TOTAL: &str = "staywindow_requests_total";

/// Histogram: request latency in seconds. Labels: command.
pub const REQUEST_DURATION_SECONDS: &str = "staywindow_request_duration_seconds";

// ── Engine outcomes ─────────────────────────────────────────────

/// Counter: booking evaluations. Labels: outcome (valid/invalid).
pub const EVALUATIONS_TOTAL: &str = "staywindow_evaluations_total";

/// Counter: rules that overrode a default. Labels: family (stay/window).
pub const RULES_APPLIED_TOTAL: &str = "staywindow_rules_applied_total";

/// Counter: advisory warnings attached to results.
pub const WARNINGS_TOTAL: &str = "staywindow_warnings_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "staywindow_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "staywindow_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "staywindow_connections_rejected_total";

/// Gauge: rule sets held in the property cache.
pub const PROPERTIES_LOADED: &str = "staywindow_properties_loaded";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Record what an evaluation decided.
pub fn record_evaluation(result: &ValidationResult) {
    let outcome = if result.is_valid { "valid" } else { "invalid" };
    metrics::counter!(EVALUATIONS_TOTAL, "outcome" => outcome).increment(1);
    if result.applied_rules.stay_rule.is_some() {
        metrics::counter!(RULES_APPLIED_TOTAL, "family" => "stay").increment(1);
    }
    if result.applied_rules.window_rule.is_some() {
        metrics::counter!(RULES_APPLIED_TOTAL, "family" => "window").increment(1);
    }
    if !result.warnings.is_empty() {
        metrics::counter!(WARNINGS_TOTAL).increment(result.warnings.len() as u64);
    }
}
