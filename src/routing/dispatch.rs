//! Method + action dispatch table.
//!
//! # Responsibilities
//! - Map (method, action) to a handler category
//! - Enforce per-partition permission rules before any backend call
//! - Wrap handlers that require authentication
//!
//! # Design Decisions
//! - Table selection is a pure function, testable without HTTP plumbing
//! - Blob removal from the main partition is rejected here, explicitly,
//!   not left to the removal handler
//! - Unsupported combinations produce a fixed client error, never a panic

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};

use crate::auth::{self, AccessCheck};
use crate::http::handlers;
use crate::partition::Partition;
use crate::storage::Storage;

use super::error::RequestError;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A one-shot capability that consumes a request and produces a
/// response. Auth wrapping decorates one of these with a credential
/// check.
pub struct Handler(Box<dyn FnOnce(Request<Body>) -> HandlerFuture + Send>);

impl Handler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Request<Body>) -> Fut + Send + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Handler(Box::new(move |req| Box::pin(f(req))))
    }

    /// A handler that ignores the request and responds with `err`.
    pub fn deny(err: RequestError) -> Self {
        Handler::new(move |_req| async move { err.into_response() })
    }

    pub async fn run(self, req: Request<Body>) -> Response {
        (self.0)(req).await
    }
}

/// Handler categories of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET` with any action not named below: stream the blob whose
    /// reference is the action string.
    GetBlob,
    EnumerateBlobs,
    Stat,
    Upload,
    Remove,
    /// Non-standard single-blob `PUT`, kept for old clients.
    LegacyPut,
    Unsupported,
}

impl Route {
    pub fn for_request(method: &Method, action: &str) -> Route {
        match *method {
            Method::GET => match action {
                "enumerate-blobs" => Route::EnumerateBlobs,
                "stat" => Route::Stat,
                _ => Route::GetBlob,
            },
            Method::POST => match action {
                "stat" => Route::Stat,
                "upload" => Route::Upload,
                "remove" => Route::Remove,
                _ => Route::Unsupported,
            },
            Method::PUT => Route::LegacyPut,
            _ => Route::Unsupported,
        }
    }

    /// Plain blob GETs are the only authenticated-free entry in the
    /// table; everything else requires credentials.
    pub fn requires_auth(self) -> bool {
        !matches!(self, Route::GetBlob | Route::Unsupported)
    }
}

/// Partition permission rules, checked before a handler is built so a
/// denied request never reaches the backend.
pub fn check_permissions(route: Route, partition: &Partition) -> Result<(), RequestError> {
    match route {
        Route::GetBlob | Route::EnumerateBlobs if !partition.readable => {
            Err(RequestError::NotReadable(partition.name.clone()))
        }
        Route::Upload | Route::LegacyPut if !partition.writable => {
            Err(RequestError::NotWritable(partition.name.clone()))
        }
        Route::Remove if partition.is_main() => Err(RequestError::RemoveFromMain),
        // stat stays open to write-only partitions: the upload protocol
        // needs it to ask which blobs the server already has
        _ => Ok(()),
    }
}

/// Select the handler for `(method, action)` against `partition` and
/// `storage`, auth-wrapped where the table demands it.
pub fn dispatch(
    method: &Method,
    action: &str,
    partition: Arc<Partition>,
    storage: Arc<dyn Storage>,
    check: Arc<AccessCheck>,
    log_requests: bool,
) -> Handler {
    if log_requests {
        tracing::info!(
            method = %method,
            partition = %partition.name,
            action,
            "blob request"
        );
    }

    let route = Route::for_request(method, action);
    if route == Route::Unsupported {
        return Handler::deny(RequestError::UnsupportedAction);
    }

    let action = action.to_string();
    let inner = match check_permissions(route, &partition) {
        // permission denials sit inside the auth wrapper: callers
        // without credentials learn nothing about partition flags
        Err(err) => Handler::deny(err),
        Ok(()) => match route {
            Route::GetBlob => {
                Handler::new(move |_req| handlers::get_blob(storage, partition, action))
            }
            Route::EnumerateBlobs => {
                Handler::new(move |req| handlers::enumerate_blobs(storage, partition, req))
            }
            Route::Stat => {
                Handler::new(move |req| handlers::stat_blobs(storage, partition, req))
            }
            Route::Upload => {
                Handler::new(move |req| handlers::upload_blobs(storage, partition, req))
            }
            Route::Remove => {
                Handler::new(move |req| handlers::remove_blobs(storage, partition, req))
            }
            Route::LegacyPut => {
                Handler::new(move |req| handlers::legacy_put(storage, partition, action, req))
            }
            Route::Unsupported => unreachable!("handled above"),
        },
    };

    if route.requires_auth() {
        auth::require_auth(check, inner)
    } else {
        inner
    }
}
