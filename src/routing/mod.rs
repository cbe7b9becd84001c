//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → grammar.rs  parse → (partition name, action)
//!     → registry    resolve partition (or fail the request)
//!     → dispatch.rs (method, action) → handler, auth-wrapped as needed
//!     → handler runs against the partition's storage backend
//! ```
//!
//! # Design Decisions
//! - Partition names are runtime configuration, so the route space is
//!   dynamic: one static protocol route plus a pre-route interceptor,
//!   never one registered route per partition
//! - Grammar is a pure string operation on the first marker occurrence;
//!   no regex in the hot path
//! - Dispatch is total: every (method, action) pair maps to a handler or
//!   to the explicit unsupported response

pub mod dispatch;
pub mod error;
pub mod grammar;

pub use dispatch::{dispatch, Handler, Route};
pub use error::RequestError;
pub use grammar::{parse_blob_path, BlobPath, CAMLI_PREFIX, PARTITION_PREFIX};
