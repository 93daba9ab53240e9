//! Per-target health records.
//!
//! # Responsibilities
//! - Own one `StatusRecord` per target id
//! - Commit each check result atomically for its target
//! - Dispatch alerts for declared-state transitions
//!
//! # Design Decisions
//! - Records live in a sharded map; one target's read-evaluate-write runs
//!   under its shard lock, other shards proceed in parallel
//! - Alerts are sent after the lock is released
//! - Records of targets removed from the directory are kept

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::directory::{Target, TargetId};
use crate::health::state::{evaluate, StatusRecord, Thresholds, Transition};
use crate::notify::Notifier;
use crate::observability::metrics;
use crate::probe::CheckResult;

/// Concurrency-safe store of declared health.
pub struct HealthStore {
    records: DashMap<TargetId, StatusRecord>,
    thresholds: Thresholds,
    notifier: Arc<dyn Notifier>,
}

impl HealthStore {
    pub fn new(thresholds: Thresholds, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            records: DashMap::new(),
            thresholds,
            notifier,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Apply one check result; returns the transition, if any.
    pub fn apply(&self, target: &Target, result: &CheckResult) -> Option<Transition> {
        let now = Utc::now();
        let (healthy, transition) = {
            let mut record = self.records.entry(target.id).or_default();
            let (next, transition) = evaluate(&record, result, self.thresholds, now);
            *record = next;
            (record.healthy, transition)
        };

        metrics::record_target_health(&target.name, healthy);

        if let Some(transition) = &transition {
            metrics::record_transition(transition.direction());
            match transition {
                Transition::Degraded { error } => {
                    tracing::error!(target_id = target.id, target_name = %target.name, error = %error, "Target is now unhealthy");
                }
                Transition::Recovered { .. } => {
                    tracing::info!(target_id = target.id, target_name = %target.name, "Target recovered");
                }
            }

            if target.notify {
                self.dispatch(target, transition);
            } else {
                tracing::debug!(target_name = %target.name, "Notifications disabled for target, skipping alert");
            }
        }

        transition
    }

    fn dispatch(&self, target: &Target, transition: &Transition) {
        if let Err(e) = self
            .notifier
            .notify(&target.name, transition.message(), transition.is_error())
        {
            metrics::record_notification_failure();
            tracing::warn!(target_name = %target.name, error = %e, "Failed to send health alert");
        }
    }

    /// Snapshot of one target's record.
    pub fn status(&self, id: TargetId) -> Option<StatusRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Snapshot of all records.
    pub fn statuses(&self) -> HashMap<TargetId, StatusRecord> {
        self.records
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
