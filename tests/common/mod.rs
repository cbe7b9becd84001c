//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use axum::Router;
use base64::prelude::{Engine, BASE64_STANDARD};
use bytes::Bytes;

use blobstored::auth::AccessCheck;
use blobstored::config::ListenerConfig;
use blobstored::http::{build_app, AppState, MountState};
use blobstored::partition::{Partition, RegistryBuilder};
use blobstored::storage::{BlobInfo, BlobRef, BlobStream, MemoryStorage, Storage, StorageError};

pub const PASSWORD: &str = "test-secret";
pub const QUEUES: &str = "queue-indexer,queue-sync";
pub const BASE_URL: &str = "http://localhost:3179";

/// Counts every backend invocation, so tests can assert that denied
/// requests never reach storage.
pub struct CountingStorage {
    pub inner: MemoryStorage,
    pub calls: AtomicUsize,
}

impl CountingStorage {
    pub fn new() -> Self {
        CountingStorage {
            inner: MemoryStorage::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn fetch(&self, partition: &Partition, blob: &BlobRef) -> Result<BlobStream, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(partition, blob).await
    }

    async fn enumerate(
        &self,
        partition: &Partition,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<BlobInfo>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.enumerate(partition, after, limit).await
    }

    async fn stat(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobInfo>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.stat(partition, blobs).await
    }

    async fn put(
        &self,
        partition: &Partition,
        blob: &BlobRef,
        data: Bytes,
    ) -> Result<BlobInfo, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.put(partition, blob, data).await
    }

    async fn remove(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobRef>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(partition, blobs).await
    }
}

/// A server wired like startup does it: main partition plus two queue
/// mirrors, counting in-memory backend.
pub fn test_app() -> (Router, Arc<CountingStorage>) {
    let storage = Arc::new(CountingStorage::new());
    let mut builder = RegistryBuilder::new();
    builder.build_mirrors(QUEUES).unwrap();
    let state = AppState {
        registry: Arc::new(builder.finalize(BASE_URL)),
        storage: storage.clone(),
        auth: Arc::new(AccessCheck::new(PASSWORD).unwrap()),
        log_requests: false,
    };
    (build_app(state, Vec::new(), &ListenerConfig::default()), storage)
}

/// Same wiring plus a write-only indexer sink mounted at /indexer.
pub fn test_app_with_mount() -> (Router, Arc<MemoryStorage>) {
    let storage = Arc::new(CountingStorage::new());
    let mount_storage = Arc::new(MemoryStorage::new());
    let auth = Arc::new(AccessCheck::new(PASSWORD).unwrap());
    let mut builder = RegistryBuilder::new();
    builder.build_mirrors(QUEUES).unwrap();
    let state = AppState {
        registry: Arc::new(builder.finalize(BASE_URL)),
        storage,
        auth: auth.clone(),
        log_requests: false,
    };
    let mounts = vec![(
        "/indexer".to_string(),
        MountState {
            partition: Arc::new(Partition::synthetic(
                "indexer",
                format!("{BASE_URL}/indexer"),
            )),
            storage: mount_storage.clone(),
            auth,
            log_requests: false,
        },
    )];
    (
        build_app(state, mounts, &ListenerConfig::default()),
        mount_storage,
    )
}

pub fn basic_auth(password: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(format!("tester:{password}")))
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(resp: Response) -> Bytes {
    axum::body::to_bytes(resp.into_body(), 64 * 1024 * 1024)
        .await
        .unwrap()
}

pub const BOUNDARY: &str = "blobstored-test-boundary";

/// Build a multipart/form-data body, one part per (name, content).
pub fn multipart_body(parts: &[(&str, &[u8])]) -> (String, Body) {
    let mut body = Vec::new();
    for (name, data) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (
        format!("multipart/form-data; boundary={BOUNDARY}"),
        Body::from(body),
    )
}
