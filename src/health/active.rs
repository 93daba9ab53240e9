//! Active health checking.
//!
//! # Responsibilities
//! - Periodically snapshot the target directory
//! - Probe every target concurrently under the check deadline
//! - Feed results to the health store
//!
//! # Design Decisions
//! - `tick` returns once the batch is launched, so slow batches may overlap
//!   the next tick; the store serializes updates per target
//! - All results of a batch are collected before any is applied
//! - A directory failure skips the tick; the next tick retries
//! - On shutdown the loop stops ticking and awaits batches still in flight;
//!   each is bounded by the check deadline

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::schema::HealthCheckConfig;
use crate::directory::{self, Directory, Target};
use crate::health::store::HealthStore;
use crate::observability::metrics;
use crate::probe::HealthProbe;
use crate::resilience::timeouts::check_with_deadline;

/// Summary of one completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub checked: usize,
    pub unhealthy: usize,
    pub transitions: usize,
}

/// Periodic scheduler driving probes into the store.
pub struct HealthMonitor<P> {
    directory: Arc<dyn Directory>,
    probe: Arc<P>,
    store: Arc<HealthStore>,
    interval: Duration,
    check_timeout: Duration,
}

impl<P: HealthProbe> HealthMonitor<P> {
    pub fn new(
        directory: Arc<dyn Directory>,
        probe: Arc<P>,
        store: Arc<HealthStore>,
        config: &HealthCheckConfig,
    ) -> Self {
        Self {
            directory,
            probe,
            store,
            interval: config.tick_interval(),
            check_timeout: config.check_timeout(),
        }
    }

    pub fn store(&self) -> &Arc<HealthStore> {
        &self.store
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.check_timeout.as_millis() as u64,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut batches: Vec<JoinHandle<TickReport>> = Vec::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    batches.retain(|batch| !batch.is_finished());
                    if let Some(batch) = self.tick().await {
                        batches.push(batch);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        batches.retain(|batch| !batch.is_finished());
        tracing::info!(in_flight = batches.len(), "Draining in-flight health check batches");
        for batch in batches {
            if let Err(e) = batch.await {
                tracing::warn!(error = %e, "Health check batch ended abnormally");
            }
        }
    }

    /// Snapshot targets and launch one batch of checks.
    ///
    /// Returns `None` when the directory could not be read.
    pub async fn tick(&self) -> Option<JoinHandle<TickReport>> {
        let targets = match directory::snapshot(&self.directory).await {
            Ok(targets) => targets,
            Err(e) => {
                metrics::record_tick("directory_error");
                tracing::warn!(error = %e, "Failed to list targets, skipping health check tick");
                return None;
            }
        };

        metrics::record_tick("launched");
        tracing::info!(targets = targets.len(), "Starting health check tick");

        Some(tokio::spawn(run_batch(
            self.probe.clone(),
            self.store.clone(),
            targets,
            self.check_timeout,
        )))
    }
}

async fn run_batch<P: HealthProbe>(
    probe: Arc<P>,
    store: Arc<HealthStore>,
    targets: Vec<Target>,
    deadline: Duration,
) -> TickReport {
    let checks = targets.into_iter().map(|target| {
        let probe = probe.clone();
        async move {
            let result = check_with_deadline(probe, target.clone(), deadline).await;
            (target, result)
        }
    });
    let results = join_all(checks).await;

    let mut report = TickReport {
        checked: results.len(),
        ..Default::default()
    };
    for (target, result) in &results {
        if !result.healthy {
            report.unhealthy += 1;
        }
        if store.apply(target, result).is_some() {
            report.transitions += 1;
        }
    }

    tracing::debug!(
        checked = report.checked,
        unhealthy = report.unhealthy,
        transitions = report.transitions,
        "Completed health check tick"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, StaticDirectory, TargetId};
    use crate::health::state::Thresholds;
    use crate::health::store::tests::{target, RecordingNotifier};
    use crate::probe::CheckResult;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails every target whose id is in `down`.
    #[derive(Default)]
    struct ScriptedProbe {
        down: Mutex<HashSet<TargetId>>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn set_down(&self, id: TargetId, down: bool) {
            let mut set = self.down.lock().unwrap();
            if down {
                set.insert(id);
            } else {
                set.remove(&id);
            }
        }
    }

    impl HealthProbe for ScriptedProbe {
        async fn check(&self, target: &Target) -> CheckResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down.lock().unwrap().contains(&target.id) {
                CheckResult::unhealthy("Error")
            } else {
                CheckResult::healthy()
            }
        }
    }

    struct BrokenDirectory;

    impl Directory for BrokenDirectory {
        fn list_targets(&self) -> Result<Vec<Target>, DirectoryError> {
            Err(DirectoryError::Io(std::io::Error::other("database offline")))
        }
    }

    fn config() -> HealthCheckConfig {
        HealthCheckConfig {
            tick_interval_ms: 20,
            check_timeout_ms: 500,
            ..Default::default()
        }
    }

    fn monitor(
        directory: Arc<dyn Directory>,
        probe: Arc<ScriptedProbe>,
        notifier: Arc<RecordingNotifier>,
    ) -> HealthMonitor<ScriptedProbe> {
        let store = Arc::new(HealthStore::new(Thresholds::default(), notifier));
        HealthMonitor::new(directory, probe, store, &config())
    }

    #[tokio::test]
    async fn test_ticks_degrade_only_failing_target() {
        let probe = Arc::new(ScriptedProbe::default());
        probe.set_down(2, true);
        let notifier = Arc::new(RecordingNotifier::default());
        let directory = Arc::new(StaticDirectory::new(vec![target(1, true), target(2, true)]));
        let monitor = monitor(directory, probe.clone(), notifier.clone());

        let mut reports = Vec::new();
        for _ in 0..3 {
            reports.push(monitor.tick().await.unwrap().await.unwrap());
        }

        assert_eq!(reports[0], TickReport { checked: 2, unhealthy: 1, transitions: 0 });
        assert_eq!(reports[2].transitions, 1);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 6);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "target-2");
        assert!(sent[0].2);

        let store = monitor.store();
        assert!(store.status(1).unwrap().healthy);
        assert_eq!(store.status(1).unwrap().consecutive_successes, 3);
        assert!(!store.status(2).unwrap().healthy);

        probe.set_down(2, false);
        for _ in 0..3 {
            monitor.tick().await.unwrap().await.unwrap();
        }
        assert_eq!(notifier.sent().len(), 2);
        assert!(store.status(2).unwrap().healthy);
    }

    #[tokio::test]
    async fn test_directory_failure_skips_tick() {
        let probe = Arc::new(ScriptedProbe::default());
        let monitor = monitor(Arc::new(BrokenDirectory), probe.clone(), Arc::default());

        assert!(monitor.tick().await.is_none());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(monitor.store().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let probe = Arc::new(ScriptedProbe::default());
        let directory = Arc::new(StaticDirectory::new(vec![target(1, true)]));
        let monitor = monitor(directory, probe.clone(), Arc::default());
        let store = monitor.store().clone();

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(monitor.run(rx));

        tokio::time::sleep(Duration::from_millis(150)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop")
            .unwrap();

        assert!(probe.calls.load(Ordering::SeqCst) >= 2);
        assert!(store.status(1).unwrap().healthy);
    }

    struct SlowProbe;

    impl HealthProbe for SlowProbe {
        async fn check(&self, _target: &Target) -> CheckResult {
            tokio::time::sleep(Duration::from_millis(200)).await;
            CheckResult::healthy()
        }
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_running_batch() {
        let directory = Arc::new(StaticDirectory::new(vec![target(1, true)]));
        let store = Arc::new(HealthStore::new(Thresholds::default(), Arc::new(RecordingNotifier::default())));
        let monitor = HealthMonitor::new(directory, Arc::new(SlowProbe), store.clone(), &config());

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(monitor.run(rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.is_empty());
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor should stop")
            .unwrap();

        assert!(store.status(1).unwrap().healthy);
    }
}
