use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::directory::{self, Target, TargetId};
use crate::health::state::{StatusRecord, TIMESTAMP_FORMAT};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub tracked_targets: usize,
}

/// Display label of a target's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthLabel {
    #[serde(rename = "UNHEALTHY")]
    Unhealthy,
    #[serde(rename = "HEALTHY")]
    Healthy,
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "MONITORING OFF")]
    MonitoringOff,
}

#[derive(Debug, Serialize)]
pub struct TargetSummary {
    pub id: TargetId,
    pub name: String,
    pub endpoint: String,
    pub health: HealthLabel,
    pub since: String,
    pub error: Option<String>,
    pub notify: bool,
}

/// Join directory targets with their records, unhealthy first.
pub fn summarize(targets: &[Target], records: &HashMap<TargetId, StatusRecord>) -> Vec<TargetSummary> {
    let mut summaries: Vec<TargetSummary> = targets
        .iter()
        .map(|target| {
            let record = records.get(&target.id);
            let health = match record {
                _ if !target.notify => HealthLabel::MonitoringOff,
                Some(r) if r.healthy => HealthLabel::Healthy,
                Some(_) => HealthLabel::Unhealthy,
                None => HealthLabel::Unknown,
            };
            TargetSummary {
                id: target.id,
                name: target.name.clone(),
                endpoint: target.endpoint.clone(),
                health,
                since: record
                    .and_then(|r| r.last_error_at)
                    .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                error: record.and_then(|r| r.last_error.clone()),
                notify: target.notify,
            }
        })
        .collect();

    summaries.sort_by_key(|s| s.health);
    summaries
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        tracked_targets: state.store.len(),
    })
}

pub async fn get_targets(
    State(state): State<AdminState>,
) -> Result<Json<Vec<TargetSummary>>, (StatusCode, String)> {
    let targets = directory::snapshot(&state.directory).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to list targets for status summary");
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;

    Ok(Json(summarize(&targets, &state.store.statuses())))
}

pub async fn get_target(
    State(state): State<AdminState>,
    Path(id): Path<TargetId>,
) -> Result<Json<StatusRecord>, StatusCode> {
    state.store.status(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}
