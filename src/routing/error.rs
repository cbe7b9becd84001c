//! Per-request error taxonomy.
//!
//! Every variant is contained within one request and surfaced as a
//! response status; none of them crash the server or mutate shared
//! state. Fatal configuration errors live with config and startup, not
//! here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Marker absent, malformed partition prefix, or invalid partition
    /// token in the path.
    #[error("Invalid blob request path.")]
    InvalidPath,

    /// Syntactically valid partition token, but no such partition was
    /// configured.
    #[error("Unconfigured partition.")]
    UnconfiguredPartition,

    /// No dispatch table entry for this method/action combination.
    #[error("Unsupported blob path or method.")]
    UnsupportedAction,

    #[error("Partition {0:?} is not writable.")]
    NotWritable(String),

    #[error("Partition {0:?} is not readable.")]
    NotReadable(String),

    /// Blobs may only be removed from non-main partitions.
    #[error("Removing from the main partition is not allowed.")]
    RemoveFromMain,
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::InvalidPath
            | RequestError::UnconfiguredPartition
            | RequestError::UnsupportedAction => StatusCode::BAD_REQUEST,
            RequestError::NotWritable(_)
            | RequestError::NotReadable(_)
            | RequestError::RemoveFromMain => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
