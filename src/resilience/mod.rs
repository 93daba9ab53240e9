//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Check for one target:
//!     → timeouts.rs (spawn probe, race against deadline)
//!     → result or synthetic "timed out" failure
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every probe has a deadline
//! - A timed-out probe is aborted, not left running

pub mod timeouts;
