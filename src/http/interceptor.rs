//! Pre-route interceptor for partition-prefixed paths.
//!
//! Partition names are runtime configuration, so they cannot be
//! registered as static routes. This middleware runs ahead of route
//! matching: any path starting with the partition-prefix token is
//! claimed unconditionally and sent through the blob pipeline, which
//! resolves the partition against the registry (or fails the request).

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::routing::PARTITION_PREFIX;

use super::handlers;
use super::server::AppState;

pub async fn partition_intercept(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.uri().path().starts_with(PARTITION_PREFIX) {
        return handlers::handle_blob_request(state, req).await;
    }
    next.run(req).await
}
