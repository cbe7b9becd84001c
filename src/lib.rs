//! blobstored, a content-addressable blob storage server.
//!
//! # Architecture Overview
//!
//! ```text
//!  Client Request
//!      │
//!      ▼
//!  ┌──────────┐   /partition-* ?   ┌─────────────┐
//!  │ axum     │──────────────────▶│ interceptor │──┐
//!  │ routes   │                    └─────────────┘  │
//!  └────┬─────┘                                     ▼
//!       │ /camli/*, mounts                  ┌──────────────┐
//!       └──────────────────────────────────▶│ grammar      │
//!                                           │ (partition,  │
//!                                           │  action)     │
//!                                           └──────┬───────┘
//!                                                  ▼
//!                                           ┌──────────────┐
//!                                           │ registry     │
//!                                           │ lookup       │
//!                                           └──────┬───────┘
//!                                                  ▼
//!                                           ┌──────────────┐   ┌─────────┐
//!                                           │ dispatch     │──▶│ auth    │
//!                                           │ (method ×    │   │ wrapper │
//!                                           │  action)     │   └────┬────┘
//!                                           └──────────────┘        ▼
//!                                                            ┌──────────────┐
//!                                                            │ storage      │
//!                                                            │ backend      │
//!                                                            └──────────────┘
//! ```
//!
//! Partitions are runtime configuration: the registry is built during
//! startup (build → bind → finalize → serve) and immutable while
//! serving, and the pre-route interceptor makes the partition path
//! space dynamic without per-partition route registration.

// Core subsystems
pub mod auth;
pub mod config;
pub mod http;
pub mod partition;
pub mod routing;
pub mod storage;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
