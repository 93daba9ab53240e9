//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, interval and timeout > 0)
//! - Check target integrity (unique ids, usable endpoints)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{MonitorConfig, NotifierKind};
use crate::directory::Target;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("health_check.{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("health_check.{field} must be at least 1")]
    ZeroThreshold { field: &'static str },

    #[error("duplicate target id {0}")]
    DuplicateTargetId(u64),

    #[error("target {id} has an empty name")]
    EmptyTargetName { id: u64 },

    #[error("target {id} has invalid endpoint '{endpoint}'")]
    InvalidEndpoint { id: u64, endpoint: String },

    #[error("notifier.slack.{field} is required when notifier.kind = \"slack\"")]
    MissingSlackSetting { field: &'static str },

    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("admin.api_key is required when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let hc = &config.health_check;
    if hc.tick_interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration { field: "tick_interval_ms" });
    }
    if hc.check_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration { field: "check_timeout_ms" });
    }
    if hc.healthy_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold { field: "healthy_threshold" });
    }
    if hc.unhealthy_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold { field: "unhealthy_threshold" });
    }

    if config.directory.path.is_none() {
        errors.extend(validate_targets(&config.targets));
    }

    if config.notifier.kind == NotifierKind::Slack {
        let slack = &config.notifier.slack;
        if slack.token.is_empty() {
            errors.push(ValidationError::MissingSlackSetting { field: "token" });
        }
        if slack.channel_ids.is_empty() {
            errors.push(ValidationError::MissingSlackSetting { field: "channel_ids" });
        }
        if Url::parse(&slack.api_url).is_err() {
            errors.push(ValidationError::MissingSlackSetting { field: "api_url" });
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.admin.enabled {
        check_address("admin.bind_address", &config.admin.bind_address, &mut errors);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a target list.
pub fn validate_targets(targets: &[Target]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for target in targets {
        if !seen.insert(target.id) {
            errors.push(ValidationError::DuplicateTargetId(target.id));
        }
        if target.name.trim().is_empty() {
            errors.push(ValidationError::EmptyTargetName { id: target.id });
        }
        let usable = Url::parse(&target.endpoint)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
            .unwrap_or(false);
        if !usable {
            errors.push(ValidationError::InvalidEndpoint {
                id: target.id,
                endpoint: target.endpoint.clone(),
            });
        }
    }

    errors
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
