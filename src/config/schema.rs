//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::directory::Target;

pub const DEFAULT_USER_AGENT: &str = "health-check-monitor";

/// Root configuration for the monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Scheduler, deadline and hysteresis settings.
    pub health_check: HealthCheckConfig,

    /// Where targets come from.
    pub directory: DirectoryConfig,

    /// Inline targets, used when `directory.path` is unset.
    pub targets: Vec<Target>,

    /// Alert delivery.
    pub notifier: NotifierConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-only status API.
    pub admin: AdminConfig,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Tick interval in milliseconds.
    pub tick_interval_ms: u64,

    /// Per-check deadline in milliseconds.
    pub check_timeout_ms: u64,

    /// Consecutive successes before an unhealthy target is declared healthy.
    pub healthy_threshold: u32,

    /// Consecutive failures before a healthy target is declared unhealthy.
    pub unhealthy_threshold: u32,

    /// User-Agent sent by the HTTP probe.
    pub user_agent: String,
}

impl HealthCheckConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30_000,
            check_timeout_ms: 10_000,
            healthy_threshold: 3,
            unhealthy_threshold: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Target directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DirectoryConfig {
    /// TOML file with `[[targets]]`, re-read every tick.
    pub path: Option<String>,
}

/// Notifier backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    #[default]
    Log,
    Slack,
}

/// Notifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub slack: SlackConfig,
}

/// Slack delivery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`).
    pub token: String,

    /// Channels that receive every alert.
    pub channel_ids: Vec<String>,

    /// Base URL of the Slack Web API.
    pub api_url: String,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_ids: Vec::new(),
            api_url: "https://slack.com/api".to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the status API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
