//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags + optional TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → consumed once by startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; partitions in particular are
//!   never reconfigured at runtime
//! - All fields have defaults so the server runs with flags alone
//! - Validation separates syntactic (serde) from semantic checks and
//!   reports every problem, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, IndexerConfig, ListenerConfig, ObservabilityConfig, PartitionsConfig,
    ServerConfig, StorageConfig,
};
pub use validation::{validate_config, ValidationError};
