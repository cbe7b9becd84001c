//! Mounting an arbitrary backend under a fixed path prefix.
//!
//! Anything satisfying the storage capability set, including an
//! indexer acting as storage, can be served at `<prefix>/camli/...`
//! with its own synthetic partition. The grammar and dispatch table are
//! reused unchanged, which is what keeps the router backend-agnostic.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::auth::AccessCheck;
use crate::partition::Partition;
use crate::routing::{dispatch, parse_blob_path};
use crate::storage::Storage;

/// Everything one mount needs; the mounted backend and partition are
/// fixed at startup like the rest of the registry.
#[derive(Clone)]
pub struct MountState {
    pub partition: Arc<Partition>,
    pub storage: Arc<dyn Storage>,
    pub auth: Arc<AccessCheck>,
    pub log_requests: bool,
}

/// Build the sub-router for one mount. Nesting strips the mount prefix,
/// so the handler sees plain `/camli/<action>` paths.
pub fn mount(state: MountState) -> Router {
    Router::new().fallback(handle_mounted).with_state(state)
}

async fn handle_mounted(State(ms): State<MountState>, req: Request<Body>) -> Response {
    let path = req.uri().path().to_string();
    let parsed = match parse_blob_path(&path) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(method = %req.method(), path = %path, "invalid mounted request path");
            return err.into_response();
        }
    };

    // any partition token in the path is ignored; the mount's synthetic
    // partition always wins
    tracing::debug!(
        partition = %ms.partition.name,
        action = %parsed.action,
        "mounted backend request"
    );
    let method = req.method().clone();
    dispatch(
        &method,
        &parsed.action,
        ms.partition,
        ms.storage,
        ms.auth,
        ms.log_requests,
    )
    .run(req)
    .await
}
