//! Target directory boundary.
//!
//! # Responsibilities
//! - Define the monitored `Target` and its probe kind
//! - Provide a read-only snapshot of all targets per call
//!
//! # Design Decisions
//! - The directory owns targets; the monitor only reads snapshots
//! - A snapshot is taken once per tick, never refreshed mid-tick
//! - Failures abandon the current tick only
//! - Async callers go through `snapshot`, which lists on the blocking pool

pub mod file;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileDirectory;

/// Identifier of a monitored target.
pub type TargetId = u64;

/// Which probe applies to a target.
///
/// `Chat`, `Edit` and `Game` are persistent-connection (WebSocket) endpoints;
/// the variant selects the hub path the probe connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[default]
    Http,
    Chat,
    Edit,
    Game,
}

impl TargetKind {
    /// Path suffix for persistent-connection kinds, `None` for plain HTTP.
    pub fn hub_path(self) -> Option<&'static str> {
        match self {
            TargetKind::Http => None,
            TargetKind::Chat => Some("/hub/chat"),
            TargetKind::Edit => Some("/hub/edit"),
            TargetKind::Game => Some("/hub/game"),
        }
    }

    pub fn is_websocket(self) -> bool {
        self.hub_path().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Http => "http",
            TargetKind::Chat => "chat",
            TargetKind::Edit => "edit",
            TargetKind::Game => "game",
        }
    }
}

/// A remote endpoint under monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Target {
    /// Stable identifier; status records are keyed by it.
    pub id: TargetId,

    /// Display name used in alerts.
    pub name: String,

    /// Base URL (`http://` or `https://`).
    pub endpoint: String,

    /// Probe kind.
    #[serde(default)]
    pub kind: TargetKind,

    /// Whether state changes are sent to the notifier.
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_notify() -> bool {
    true
}

/// Errors raised while listing targets.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read target directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse target directory: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("target listing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Source of the authoritative target list.
pub trait Directory: Send + Sync {
    /// Return the current targets in directory order.
    fn list_targets(&self) -> Result<Vec<Target>, DirectoryError>;
}

/// List targets without blocking the async runtime.
///
/// `list_targets` may do file or network IO, so it runs on the blocking pool.
pub async fn snapshot(directory: &Arc<dyn Directory>) -> Result<Vec<Target>, DirectoryError> {
    let directory = directory.clone();
    tokio::task::spawn_blocking(move || directory.list_targets()).await?
}

/// A fixed, in-memory target list.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    targets: Vec<Target>,
}

impl StaticDirectory {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }
}

impl Directory for StaticDirectory {
    fn list_targets(&self) -> Result<Vec<Target>, DirectoryError> {
        Ok(self.targets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_paths() {
        assert_eq!(TargetKind::Http.hub_path(), None);
        assert_eq!(TargetKind::Chat.hub_path(), Some("/hub/chat"));
        assert_eq!(TargetKind::Edit.hub_path(), Some("/hub/edit"));
        assert_eq!(TargetKind::Game.hub_path(), Some("/hub/game"));
        assert!(!TargetKind::Http.is_websocket());
        assert!(TargetKind::Game.is_websocket());
    }

    #[test]
    fn test_target_defaults() {
        let target: Target = toml::from_str(
            r#"
            id = 7
            name = "api"
            endpoint = "https://api.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(target.kind, TargetKind::Http);
        assert!(target.notify);
    }

    #[test]
    fn test_static_directory_snapshot() {
        let target = Target {
            id: 1,
            name: "a".into(),
            endpoint: "http://localhost".into(),
            kind: TargetKind::Chat,
            notify: false,
        };
        let directory = StaticDirectory::new(vec![target.clone()]);
        assert_eq!(directory.list_targets().unwrap(), vec![target]);
    }

    struct SlowDirectory;

    impl Directory for SlowDirectory {
        fn list_targets(&self) -> Result<Vec<Target>, DirectoryError> {
            std::thread::sleep(std::time::Duration::from_millis(300));
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_snapshot_keeps_runtime_responsive() {
        let directory: Arc<dyn Directory> = Arc::new(SlowDirectory);
        let listing = snapshot(&directory);
        tokio::pin!(listing);

        tokio::select! {
            biased;
            _ = &mut listing => panic!("slow listing finished before the timer"),
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
        }
        assert!(listing.await.unwrap().is_empty());
    }
}
