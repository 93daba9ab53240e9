//! Startup orchestration.
//!
//! # Responsibilities
//! - Build directory, notifier, probes and store from validated config
//! - Spawn the health monitor and the admin API
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The admin listener is bound before anything is spawned

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::admin::{self, AdminState};
use crate::config::schema::{MonitorConfig, NotifierKind};
use crate::directory::{Directory, FileDirectory, StaticDirectory};
use crate::health::{HealthMonitor, HealthStore, Thresholds};
use crate::lifecycle::shutdown::Shutdown;
use crate::notify::{LogNotifier, Notifier, NotifyError, SlackNotifier};
use crate::probe::ProbeSet;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP probe client: {0}")]
    Probe(#[source] reqwest::Error),

    #[error("failed to build notifier: {0}")]
    Notifier(#[from] NotifyError),

    #[error("failed to bind admin API on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// A started monitor.
pub struct Running {
    pub store: Arc<HealthStore>,
    pub admin_addr: Option<SocketAddr>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl Running {
    /// Signal every task and wait for them to exit.
    pub async fn stop(self) {
        self.shutdown.trigger();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }
    }
}

pub fn build_directory(config: &MonitorConfig) -> Arc<dyn Directory> {
    match &config.directory.path {
        Some(path) => {
            tracing::info!(path = %path, "Using file target directory");
            Arc::new(FileDirectory::new(path))
        }
        None => {
            tracing::info!(targets = config.targets.len(), "Using inline target list");
            Arc::new(StaticDirectory::new(config.targets.clone()))
        }
    }
}

pub fn build_notifier(config: &MonitorConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    Ok(match config.notifier.kind {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Slack => {
            tracing::info!(
                channels = config.notifier.slack.channel_ids.len(),
                "Slack notifications enabled"
            );
            Arc::new(SlackNotifier::new(&config.notifier.slack)?)
        }
    })
}

/// Build every subsystem and spawn the background tasks.
pub async fn start(config: &MonitorConfig) -> Result<Running, StartupError> {
    let directory = build_directory(config);
    let notifier = build_notifier(config)?;
    let probes = Arc::new(ProbeSet::new(&config.health_check).map_err(StartupError::Probe)?);
    let store = Arc::new(HealthStore::new(Thresholds::from(&config.health_check), notifier));
    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    let mut admin_addr = None;
    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address)
            .await
            .map_err(|source| StartupError::Bind {
                addr: config.admin.bind_address.clone(),
                source,
            })?;
        admin_addr = listener.local_addr().ok();

        let state = AdminState {
            store: store.clone(),
            directory: directory.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let admin_shutdown = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        }));
    }

    let monitor = HealthMonitor::new(directory, probes, store.clone(), &config.health_check);
    tasks.push(tokio::spawn(monitor.run(shutdown.subscribe())));

    tracing::info!(
        tick_interval_ms = config.health_check.tick_interval_ms,
        check_timeout_ms = config.health_check.check_timeout_ms,
        healthy_threshold = config.health_check.healthy_threshold,
        unhealthy_threshold = config.health_check.unhealthy_threshold,
        "Monitor started"
    );

    Ok(Running {
        store,
        admin_addr,
        shutdown,
        tasks,
    })
}
