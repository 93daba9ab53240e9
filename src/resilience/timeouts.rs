//! Timeout enforcement.
//!
//! # Responsibilities
//! - Run each probe as its own task under a deadline
//! - Convert a missed deadline into an unhealthy result
//! - Cancel the probe task on timeout so its socket is released
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timeout is a normal check result, not an error
//! - A panicking probe counts as an unexpected failure

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::directory::Target;
use crate::observability::metrics;
use crate::probe::{CheckResult, HealthProbe};

/// Descriptor reported when a probe misses its deadline.
pub const HEALTH_CHECK_TIMED_OUT: &str = "health check timed out";

/// Descriptor reported when a probe task dies.
pub const HEALTH_CHECK_FAILED: &str = "unexpected health check error";

/// Check `target` with `probe`, giving up after `deadline`.
pub async fn check_with_deadline<P: HealthProbe>(
    probe: Arc<P>,
    target: Target,
    deadline: Duration,
) -> CheckResult {
    let kind = target.kind.as_str();
    let name = target.name.clone();
    let started = Instant::now();

    let mut task = tokio::spawn(async move { probe.check(&target).await });

    let result = match timeout(deadline, &mut task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::error!(target_name = %name, error = %e, "Health check task failed");
            CheckResult::unhealthy(HEALTH_CHECK_FAILED)
        }
        Err(_) => {
            task.abort();
            tracing::warn!(
                target_name = %name,
                deadline_ms = deadline.as_millis() as u64,
                "Health check timed out"
            );
            CheckResult::unhealthy(HEALTH_CHECK_TIMED_OUT)
        }
    };

    metrics::record_check(kind, result.healthy, started.elapsed());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::TargetKind;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StalledProbe {
        finished: Arc<AtomicBool>,
    }

    impl HealthProbe for StalledProbe {
        async fn check(&self, _target: &Target) -> CheckResult {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            self.finished.store(true, Ordering::SeqCst);
            CheckResult::healthy()
        }
    }

    struct FixedProbe(CheckResult);

    impl HealthProbe for FixedProbe {
        async fn check(&self, _target: &Target) -> CheckResult {
            self.0.clone()
        }
    }

    struct PanickingProbe;

    impl HealthProbe for PanickingProbe {
        async fn check(&self, _target: &Target) -> CheckResult {
            panic!("probe exploded")
        }
    }

    fn target(kind: TargetKind) -> Target {
        Target {
            id: 1,
            name: "slow".into(),
            endpoint: "http://127.0.0.1:1".into(),
            kind,
            notify: true,
        }
    }

    #[tokio::test]
    async fn test_stalled_probe_times_out_for_every_kind() {
        for kind in [TargetKind::Http, TargetKind::Chat, TargetKind::Edit, TargetKind::Game] {
            let finished = Arc::new(AtomicBool::new(false));
            let probe = Arc::new(StalledProbe { finished: finished.clone() });

            let result = check_with_deadline(probe, target(kind), Duration::from_millis(50)).await;

            assert_eq!(result, CheckResult::unhealthy(HEALTH_CHECK_TIMED_OUT));
            assert!(!finished.load(Ordering::SeqCst));
        }
    }

    #[tokio::test]
    async fn test_result_before_deadline_is_unchanged() {
        let expected = CheckResult::unhealthy("web server refused the connection");
        let probe = Arc::new(FixedProbe(expected.clone()));

        let result = check_with_deadline(probe, target(TargetKind::Http), Duration::from_secs(5)).await;
        assert_eq!(result, expected);

        let probe = Arc::new(FixedProbe(CheckResult::healthy()));
        let result = check_with_deadline(probe, target(TargetKind::Chat), Duration::from_secs(5)).await;
        assert!(result.healthy);
    }

    #[tokio::test]
    async fn test_panicking_probe_is_unhealthy() {
        let result =
            check_with_deadline(Arc::new(PanickingProbe), target(TargetKind::Http), Duration::from_secs(5)).await;
        assert_eq!(result, CheckResult::unhealthy(HEALTH_CHECK_FAILED));
    }
}
