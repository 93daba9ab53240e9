//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define monitor metrics (checks, latency, transitions, ticks)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-target declared health
//!
//! # Metrics
//! - `health_checks_total` (counter): checks by kind, outcome
//! - `health_check_duration_seconds` (histogram): probe latency by kind
//! - `health_target_up` (gauge): 1=healthy, 0=unhealthy, by target
//! - `health_transitions_total` (counter): declared state flips by direction
//! - `health_ticks_total` (counter): scheduler ticks by outcome
//! - `health_notifications_failed_total` (counter): undelivered alerts
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are low-cardinality except the target name

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_check(kind: &'static str, healthy: bool, elapsed: Duration) {
    let outcome = if healthy { "healthy" } else { "unhealthy" };
    counter!("health_checks_total", "kind" => kind, "outcome" => outcome).increment(1);
    histogram!("health_check_duration_seconds", "kind" => kind).record(elapsed.as_secs_f64());
}

pub fn record_target_health(target_name: &str, healthy: bool) {
    gauge!("health_target_up", "target" => target_name.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_transition(direction: &'static str) {
    counter!("health_transitions_total", "direction" => direction).increment(1);
}

pub fn record_tick(outcome: &'static str) {
    counter!("health_ticks_total", "outcome" => outcome).increment(1);
}

pub fn record_notification_failure() {
    counter!("health_notifications_failed_total").increment(1);
}
