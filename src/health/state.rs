//! Target health state machine.
//!
//! # States
//! - Healthy: target is reachable (also the assumed state before any check)
//! - Unhealthy: target failed enough consecutive checks
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: consecutive failures >= unhealthy_threshold
//! Unhealthy → Healthy: consecutive successes >= healthy_threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping
//! - Counters are pinned to the threshold on a transition, not reset
//! - `evaluate` is pure; the store commits its output atomically per target

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::schema::HealthCheckConfig;
use crate::probe::CheckResult;

/// Descriptor used when a failed check carries no error text.
pub const UNKNOWN_ERROR: &str = "unknown error during health check";

/// Format of timestamps shown in alerts and the status API.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Consecutive-result thresholds for flipping the declared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub healthy: u32,
    pub unhealthy: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            healthy: 3,
            unhealthy: 3,
        }
    }
}

impl From<&HealthCheckConfig> for Thresholds {
    fn from(config: &HealthCheckConfig) -> Self {
        Self {
            healthy: config.healthy_threshold,
            unhealthy: config.unhealthy_threshold,
        }
    }
}

/// Declared health of one target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusRecord {
    pub healthy: bool,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_successes: 0,
            consecutive_failures: 0,
            last_error: None,
            last_error_at: None,
        }
    }
}

/// A change of declared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Unhealthy → Healthy; `message` summarizes the cleared error.
    Recovered { message: String },
    /// Healthy → Unhealthy; `error` is the failing check's descriptor.
    Degraded { error: String },
}

impl Transition {
    pub fn message(&self) -> &str {
        match self {
            Transition::Recovered { message } => message,
            Transition::Degraded { error } => error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Transition::Degraded { .. })
    }

    pub fn direction(&self) -> &'static str {
        match self {
            Transition::Recovered { .. } => "recovered",
            Transition::Degraded { .. } => "degraded",
        }
    }
}

/// Compute the next record for one check result.
pub fn evaluate(
    record: &StatusRecord,
    result: &CheckResult,
    thresholds: Thresholds,
    now: DateTime<Utc>,
) -> (StatusRecord, Option<Transition>) {
    let mut next = record.clone();

    if result.healthy {
        next.consecutive_successes = next.consecutive_successes.saturating_add(1);
        next.consecutive_failures = 0;
    } else {
        next.consecutive_failures = next.consecutive_failures.saturating_add(1);
        next.consecutive_successes = 0;
    }

    if result.healthy && !next.healthy && next.consecutive_successes >= thresholds.healthy {
        let message = recovery_message(next.last_error.as_deref(), next.last_error_at);
        next.healthy = true;
        next.last_error = None;
        next.last_error_at = None;
        next.consecutive_successes = thresholds.healthy;
        next.consecutive_failures = 0;
        return (next, Some(Transition::Recovered { message }));
    }

    if !result.healthy && next.healthy && next.consecutive_failures >= thresholds.unhealthy {
        let error = result.error.clone().unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        next.healthy = false;
        next.last_error = Some(error.clone());
        next.last_error_at = Some(now);
        next.consecutive_failures = thresholds.unhealthy;
        next.consecutive_successes = 0;
        return (next, Some(Transition::Degraded { error }));
    }

    (next, None)
}

fn recovery_message(last_error: Option<&str>, since: Option<DateTime<Utc>>) -> String {
    let since = since
        .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "Target is healthy again.\n*Previous error:* {}\n*Previous error time:* {}",
        last_error.unwrap_or("N/A"),
        since
    )
}
