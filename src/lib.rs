//! Reachability monitor library.

pub mod admin;
pub mod config;
pub mod directory;
pub mod health;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod probe;
pub mod resilience;

pub use config::MonitorConfig;
pub use health::{HealthMonitor, HealthStore};
pub use lifecycle::Shutdown;
