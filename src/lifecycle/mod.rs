//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Build subsystems → Spawn monitor + admin API
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Tasks exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - In-flight check batches are drained on shutdown; state is not durable

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
