//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Snapshot directory
//!     → Probe each target (resilience::timeouts deadline)
//!     → Apply results to store.rs
//!
//! Store (store.rs):
//!     Per-target record, serialized per key
//!     → state.rs evaluates the transition
//!     → Notifier on transition
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - State transitions require consecutive successes/failures
//! - Health state is per-target, in memory, not durable
//! - A never-checked target is assumed healthy

pub mod active;
pub mod state;
pub mod store;

pub use active::{HealthMonitor, TickReport};
pub use state::{StatusRecord, Thresholds, Transition};
pub use store::HealthStore;
