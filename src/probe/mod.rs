//! Reachability probes.
//!
//! # Data Flow
//! ```text
//! Target
//!     → ProbeSet::select (pure, by TargetKind)
//!     → http.rs      (one GET, errors classified)
//!     → websocket.rs (one connect attempt, session always closed)
//!     → CheckResult
//! ```
//!
//! # Design Decisions
//! - Closed set of strategies; adding a kind means adding a variant
//! - Probes never return raw transport errors, only a fixed descriptor
//! - Transport timeouts outlast the check deadline, so a stalled target is
//!   always reported by the deadline with one message for every kind

pub mod http;
pub mod websocket;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::schema::HealthCheckConfig;
use crate::directory::Target;

pub use self::http::{HttpProbe, HttpProbeError};
pub use self::websocket::{WebSocketProbe, WebSocketProbeError};

/// Extra time a probe's transport gets beyond the check deadline.
pub const TRANSPORT_GRACE: Duration = Duration::from_secs(1);

/// Outcome of one reachability check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckResult {
    pub healthy: bool,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            error: Some(error.into()),
        }
    }
}

/// Anything that can check one target.
pub trait HealthProbe: Send + Sync + 'static {
    fn check(&self, target: &Target) -> impl Future<Output = CheckResult> + Send;
}

/// The strategy chosen for a target.
#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    Http(&'a HttpProbe),
    WebSocket(&'a WebSocketProbe),
}

impl Strategy<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Http(_) => "http",
            Strategy::WebSocket(_) => "websocket",
        }
    }

    pub async fn check(&self, target: &Target) -> CheckResult {
        match self {
            Strategy::Http(probe) => probe.check(target).await,
            Strategy::WebSocket(probe) => probe.check(target).await,
        }
    }
}

/// Both probe strategies, built once from configuration.
#[derive(Debug, Clone)]
pub struct ProbeSet {
    http: HttpProbe,
    websocket: WebSocketProbe,
}

impl ProbeSet {
    /// Build for production use under `check_with_deadline`.
    ///
    /// Transports time out `TRANSPORT_GRACE` after the check deadline; they only
    /// bound sockets that outlive an aborted check.
    pub fn new(config: &HealthCheckConfig) -> Result<Self, reqwest::Error> {
        let timeout = config.check_timeout() + TRANSPORT_GRACE;
        Ok(Self {
            http: HttpProbe::new(timeout, &config.user_agent)?,
            websocket: WebSocketProbe::new(timeout),
        })
    }

    /// Build with an explicit transport timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: HttpProbe::new(timeout, crate::config::schema::DEFAULT_USER_AGENT)?,
            websocket: WebSocketProbe::new(timeout),
        })
    }

    /// Map a target to its strategy.
    pub fn select(&self, target: &Target) -> Strategy<'_> {
        if target.kind.is_websocket() {
            Strategy::WebSocket(&self.websocket)
        } else {
            Strategy::Http(&self.http)
        }
    }
}

impl HealthProbe for ProbeSet {
    async fn check(&self, target: &Target) -> CheckResult {
        let strategy = self.select(target);
        tracing::trace!(target_name = %target.name, strategy = strategy.name(), "Strategy selected");
        strategy.check(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::TargetKind;

    fn target(kind: TargetKind) -> Target {
        Target {
            id: 1,
            name: "t".into(),
            endpoint: "http://127.0.0.1:9".into(),
            kind,
            notify: true,
        }
    }

    #[test]
    fn test_select_dispatches_by_kind() {
        let probes = ProbeSet::with_timeout(Duration::from_secs(1)).unwrap();

        assert!(matches!(probes.select(&target(TargetKind::Http)), Strategy::Http(_)));
        for kind in [TargetKind::Chat, TargetKind::Edit, TargetKind::Game] {
            assert!(matches!(probes.select(&target(kind)), Strategy::WebSocket(_)));
        }
    }

    #[test]
    fn test_transport_outlasts_deadline() {
        let config = HealthCheckConfig {
            check_timeout_ms: 200,
            ..Default::default()
        };
        let probes = ProbeSet::new(&config).unwrap();

        assert_eq!(probes.websocket.connect_timeout(), Duration::from_millis(1200));
        assert!(probes.websocket.connect_timeout() > config.check_timeout());
    }

    #[test]
    fn test_check_result_constructors() {
        assert_eq!(CheckResult::healthy().error, None);

        let failed = CheckResult::unhealthy("boom");
        assert!(!failed.healthy);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
