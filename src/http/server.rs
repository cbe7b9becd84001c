//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum router: static protocol routes, mounts, fallback
//! - Install the pre-route partition interceptor ahead of routing
//! - Wire middleware (request ID, body limit, timeout, tracing)
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - Only `/` and `/camli/` are static routes; partition paths are
//!   claimed dynamically by the interceptor
//! - Unmatched paths get the fixed unsupported-request error, not a
//!   bare 404, matching the protocol's error contract

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AccessCheck;
use crate::config::{ListenerConfig, ServerConfig};
use crate::lifecycle::Shutdown;
use crate::partition::PartitionRegistry;
use crate::routing::RequestError;
use crate::storage::Storage;

use super::handlers;
use super::interceptor::partition_intercept;
use super::mount::{mount, MountState};
use super::request::request_id_middleware;

/// Shared state injected into handlers. Built once at startup; every
/// field is immutable during the serving phase.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PartitionRegistry>,
    pub storage: Arc<dyn Storage>,
    pub auth: Arc<AccessCheck>,
    pub log_requests: bool,
}

/// Assemble the full application router. Exposed separately from
/// [`HttpServer`] so tests can drive it in-process.
pub fn build_app(
    state: AppState,
    mounts: Vec<(String, MountState)>,
    listener: &ListenerConfig,
) -> Router {
    let mut app = Router::new()
        .route("/", get(root_page))
        .route("/camli/", any(blob_handler))
        .route("/camli/{*action}", any(blob_handler))
        .fallback(unsupported)
        .with_state(state.clone());

    for (prefix, mount_state) in mounts {
        app = app.nest(&prefix, mount(mount_state));
    }

    app.layer(middleware::from_fn_with_state(state, partition_intercept))
        .layer(RequestBodyLimitLayer::new(listener.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            listener.request_timeout_secs,
        )))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server for the blob protocol.
pub struct HttpServer {
    app: Router,
}

impl HttpServer {
    pub fn new(
        config: &ServerConfig,
        state: AppState,
        mounts: Vec<(String, MountState)>,
    ) -> Self {
        HttpServer {
            app: build_app(state, mounts, &config.listener),
        }
    }

    /// Serve on an already-bound listener until shutdown triggers.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut rx = shutdown.subscribe();
        axum::serve(listener, self.app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn blob_handler(State(state): State<AppState>, req: Request<Body>) -> Response {
    handlers::handle_blob_request(state, req).await
}

async fn root_page() -> Html<&'static str> {
    Html(
        "<html><body>This is blobstored, a content-addressable \
         blob storage server.</body></html>\n",
    )
}

async fn unsupported() -> Response {
    RequestError::UnsupportedAction.into_response()
}
