//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → read once by lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; intervals and thresholds are not hot-reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, DirectoryConfig, HealthCheckConfig, MonitorConfig, NotifierConfig, NotifierKind,
    ObservabilityConfig, SlackConfig,
};
