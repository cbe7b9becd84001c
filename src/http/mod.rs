//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware layers)
//!     → interceptor.rs (claims /partition-* paths before routing)
//!     → handlers.rs (parse path, resolve partition, dispatch, respond)
//!     → mount.rs (same pipeline under a fixed prefix, own partition)
//! ```

pub mod handlers;
pub mod interceptor;
pub mod mount;
pub mod request;
pub mod server;

pub use mount::MountState;
pub use request::X_REQUEST_ID;
pub use server::{build_app, AppState, HttpServer};
