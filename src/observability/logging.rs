//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Respect RUST_LOG when set, config default otherwise
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Level configurable via config and environment

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("blobstored={default_level},tower_http=warn").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
