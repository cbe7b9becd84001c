//! Server lifecycle: startup phase ordering and shutdown coordination.
//!
//! # Design Decisions
//! - Startup is a strict build → bind → finalize → serve sequence; the
//!   registry type-state makes skipping a phase a compile error
//! - Fail fast: any startup error is fatal, reported once, exit non-zero
//! - Shutdown is a broadcast every long-running task can subscribe to

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
