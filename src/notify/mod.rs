//! Alert delivery boundary.
//!
//! # Responsibilities
//! - Define the `Notifier` seam used by the health store
//! - Format alert text shared by all channels
//!
//! # Design Decisions
//! - Delivery is best-effort and fire-and-forget
//! - A failed delivery is logged by the caller and never rolls back state

pub mod slack;

use chrono::{DateTime, Local};
use thiserror::Error;

pub use slack::SlackNotifier;

/// Errors raised while handing an alert to a channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),

    #[error("notification rejected: {0}")]
    Rejected(String),

    #[error("notification transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Delivers human-readable alerts.
pub trait Notifier: Send + Sync {
    fn notify(&self, target_name: &str, message: &str, is_error: bool) -> Result<(), NotifyError>;
}

/// Writes alerts to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, target_name: &str, message: &str, is_error: bool) -> Result<(), NotifyError> {
        if is_error {
            tracing::error!(target_name = %target_name, details = %message, "Target unhealthy");
        } else {
            tracing::info!(target_name = %target_name, details = %message, "Target recovered");
        }
        Ok(())
    }
}

/// Render the alert body.
pub fn format_message(target_name: &str, details: &str, is_error: bool, at: DateTime<Local>) -> String {
    let (emoji, status, label) = if is_error {
        (":red_circle:", "Error Detected", "Error Details")
    } else {
        (":large_green_circle:", "Recovered", "Recovery Messages")
    };

    format!(
        "{emoji} Server {status}\n*Server:* {target_name}\n*{label}:* {details}\n*Time:* {}",
        at.format("%Y-%m-%d %H:%M:%S")
    )
}
