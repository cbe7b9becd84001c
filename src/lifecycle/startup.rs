//! Startup orchestration.
//!
//! # Responsibilities
//! - Build: credential, storage backend, partition declarations
//! - Bind: listener (the base URL becomes known here)
//! - Finalize: freeze the partition registry with urlbase filled in
//! - Serve: accept traffic, with graceful shutdown
//!
//! # Design Decisions
//! - Phases run in order, never concurrently; serving cannot start
//!   before finalize because the registry does not exist until then
//! - Every error here is fatal and reported to the operator once

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::{AccessCheck, CredentialError};
use crate::config::ServerConfig;
use crate::http::{AppState, HttpServer, MountState};
use crate::partition::{Partition, RegistryBuilder, RegistryError};
use crate::storage::{DiskStorage, MemoryStorage, Storage, StorageError};

use super::shutdown::Shutdown;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("storage root error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the server through its whole lifecycle. Returns only after
/// graceful shutdown or a fatal error.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    // build phase
    let auth = Arc::new(AccessCheck::from_sources(
        config.auth.password_file.as_deref().map(Path::new),
    )?);
    let storage: Arc<dyn Storage> = Arc::new(DiskStorage::new(&config.storage.root)?);
    let mut builder = RegistryBuilder::new();
    builder.build_mirrors(&config.partitions.queue_partitions)?;

    // bind phase
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.listener.bind_address.clone(),
            source,
        })?;
    let base_url = format!("http://{}", listener.local_addr()?);
    tracing::info!(base_url = %base_url, "listener bound");

    // finalize phase
    let registry = Arc::new(builder.finalize(&base_url));

    // serve phase
    let state = AppState {
        registry,
        storage,
        auth: auth.clone(),
        log_requests: config.observability.request_log,
    };

    let mut mounts = Vec::new();
    if config.indexer.enabled {
        let partition = Arc::new(Partition::synthetic("indexer", format!("{base_url}/indexer")));
        mounts.push((
            "/indexer".to_string(),
            MountState {
                partition,
                storage: Arc::new(MemoryStorage::new()),
                auth,
                log_requests: config.observability.request_log,
            },
        ));
        tracing::info!(
            database = %config.indexer.database,
            "dev indexer sink mounted at /indexer"
        );
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(&config, state, mounts);
    server.run(listener, &shutdown).await?;
    Ok(())
}
