//! Blob protocol request handlers.
//!
//! # Responsibilities
//! - Parse the request path and resolve the target partition
//! - Run the dispatched handler and record request metrics
//! - Implement the per-action handlers the dispatch table selects
//!
//! # Design Decisions
//! - Backend failures become response statuses here; they never escape
//!   a request
//! - Malformed blob references in an upload skip that part and are
//!   reported back, instead of failing the whole batch

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::partition::Partition;
use crate::routing::{dispatch, parse_blob_path, RequestError};
use crate::storage::{BlobInfo, BlobRef, Storage, StorageError};
use crate::observability::metrics;

use super::server::AppState;

/// Largest accepted blob, advertised in stat responses.
pub const MAX_UPLOAD_SIZE: u64 = 32 * 1024 * 1024;

/// Hard cap on one enumeration page.
pub const MAX_ENUMERATE: usize = 10_000;

const DEFAULT_ENUMERATE_LIMIT: usize = 1_000;

/// Largest accepted stat/remove form body.
const MAX_FORM_SIZE: usize = 1024 * 1024;

/// Core blob request pipeline: parse → resolve → dispatch → run.
pub async fn handle_blob_request(state: AppState, req: Request<Body>) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let parsed = match parse_blob_path(&path) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(method = %method, path = %path, "invalid blob request path");
            let resp = err.into_response();
            metrics::record_request(method.as_str(), resp.status().as_u16(), "none", start);
            return resp;
        }
    };

    let Some(partition) = state.registry.lookup(&parsed.partition) else {
        let resp = RequestError::UnconfiguredPartition.into_response();
        metrics::record_request(method.as_str(), resp.status().as_u16(), "none", start);
        return resp;
    };

    let handler = dispatch(
        &method,
        &parsed.action,
        partition.clone(),
        state.storage.clone(),
        state.auth.clone(),
        state.log_requests,
    );
    let resp = handler.run(req).await;
    metrics::record_request(
        method.as_str(),
        resp.status().as_u16(),
        &partition.name,
        start,
    );
    resp
}

fn storage_error_response(err: StorageError) -> Response {
    match err {
        StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "Blob not found.").into_response(),
        StorageError::InvalidRef(_) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        StorageError::Io(_) => {
            tracing::error!(error = %err, "storage backend failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error.").into_response()
        }
    }
}

/// `GET /camli/<blobref>`: stream blob content.
pub async fn get_blob(
    storage: Arc<dyn Storage>,
    partition: Arc<Partition>,
    blob_ref: String,
) -> Response {
    let blob = match BlobRef::parse(&blob_ref) {
        Ok(b) => b,
        Err(err) => return storage_error_response(err),
    };
    match storage.fetch(&partition, &blob).await {
        Ok(stream) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            Body::from_stream(stream),
        )
            .into_response(),
        Err(err) => storage_error_response(err),
    }
}

#[derive(Serialize)]
struct EnumerateResponse {
    blobs: Vec<BlobInfo>,
    #[serde(rename = "continueAfter", skip_serializing_if = "Option::is_none")]
    continue_after: Option<String>,
    #[serde(rename = "canLongPoll")]
    can_long_poll: bool,
}

/// `GET /camli/enumerate-blobs?after=&limit=`: ordered blob listing.
pub async fn enumerate_blobs(
    storage: Arc<dyn Storage>,
    partition: Arc<Partition>,
    req: Request<Body>,
) -> Response {
    let mut after = None;
    let mut limit = DEFAULT_ENUMERATE_LIMIT;
    if let Some(query) = req.uri().query() {
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            match k.as_ref() {
                "after" => after = Some(v.into_owned()),
                "limit" => match v.parse::<usize>() {
                    Ok(n) => limit = n.min(MAX_ENUMERATE),
                    Err(_) => {
                        return (StatusCode::BAD_REQUEST, "Invalid limit parameter.")
                            .into_response()
                    }
                },
                _ => {}
            }
        }
    }

    match storage.enumerate(&partition, after.as_deref(), limit).await {
        Ok(blobs) => {
            let continue_after = if blobs.len() == limit {
                blobs.last().map(|b| b.blob_ref.clone())
            } else {
                None
            };
            Json(EnumerateResponse {
                blobs,
                continue_after,
                can_long_poll: false,
            })
            .into_response()
        }
        Err(err) => storage_error_response(err),
    }
}

/// Pull `blob1..blobN` parameters out of a urlencoded query or form.
fn blob_params(raw: &[u8]) -> Result<Vec<BlobRef>, StorageError> {
    let mut refs = Vec::new();
    for (k, v) in form_urlencoded::parse(raw) {
        if let Some(n) = k.strip_prefix("blob") {
            if n.parse::<usize>().is_ok() {
                refs.push(BlobRef::parse(&v)?);
            }
        }
    }
    Ok(refs)
}

#[derive(Serialize)]
struct StatResponse {
    stat: Vec<BlobInfo>,
    #[serde(rename = "maxUploadSize")]
    max_upload_size: u64,
    #[serde(rename = "uploadUrl")]
    upload_url: String,
}

/// `GET`/`POST` stat: existence and size metadata for listed refs.
/// GET takes refs in the query string, POST in a urlencoded body.
pub async fn stat_blobs(
    storage: Arc<dyn Storage>,
    partition: Arc<Partition>,
    req: Request<Body>,
) -> Response {
    let raw = if req.method() == Method::GET {
        req.uri().query().unwrap_or("").as_bytes().to_vec()
    } else {
        match axum::body::to_bytes(req.into_body(), MAX_FORM_SIZE).await {
            Ok(bytes) => bytes.to_vec(),
            Err(_) => return (StatusCode::BAD_REQUEST, "Could not read form body.").into_response(),
        }
    };

    let refs = match blob_params(&raw) {
        Ok(refs) => refs,
        Err(err) => return storage_error_response(err),
    };

    match storage.stat(&partition, &refs).await {
        Ok(stat) => Json(StatResponse {
            stat,
            max_upload_size: MAX_UPLOAD_SIZE,
            upload_url: format!("{}/camli/upload", partition.urlbase),
        })
        .into_response(),
        Err(err) => storage_error_response(err),
    }
}

#[derive(Serialize)]
struct UploadResponse {
    received: Vec<BlobInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    #[serde(rename = "maxUploadSize")]
    max_upload_size: u64,
    #[serde(rename = "uploadUrl")]
    upload_url: String,
}

/// `POST /camli/upload`: multipart batch upload, one part per blob,
/// part name is the blob reference.
pub async fn upload_blobs(
    storage: Arc<dyn Storage>,
    partition: Arc<Partition>,
    req: Request<Body>,
) -> Response {
    let mut multipart = match Multipart::from_request(req, &()).await {
        Ok(m) => m,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Expected multipart/form-data upload: {err}"),
            )
                .into_response()
        }
    };

    let mut received = Vec::new();
    let mut errors = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return (StatusCode::BAD_REQUEST, format!("Malformed multipart body: {err}"))
                    .into_response()
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let blob = match BlobRef::parse(&name) {
            Ok(b) => b,
            Err(_) => {
                tracing::warn!(part = %name, "skipping upload part with invalid blob ref");
                errors.push(name);
                continue;
            }
        };
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => {
                return (StatusCode::BAD_REQUEST, format!("Could not read upload part: {err}"))
                    .into_response()
            }
        };
        match storage.put(&partition, &blob, data).await {
            Ok(info) => received.push(info),
            Err(err) => return storage_error_response(err),
        }
    }

    Json(UploadResponse {
        received,
        errors,
        max_upload_size: MAX_UPLOAD_SIZE,
        upload_url: format!("{}/camli/upload", partition.urlbase),
    })
    .into_response()
}

#[derive(Serialize)]
struct RemoveResponse {
    removed: Vec<String>,
}

/// `POST /camli/remove`: delete blobs listed in a urlencoded body.
/// The dispatcher has already rejected removal from the main partition.
pub async fn remove_blobs(
    storage: Arc<dyn Storage>,
    partition: Arc<Partition>,
    req: Request<Body>,
) -> Response {
    let raw = match axum::body::to_bytes(req.into_body(), MAX_FORM_SIZE).await {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::BAD_REQUEST, "Could not read form body.").into_response(),
    };
    let refs = match blob_params(&raw) {
        Ok(refs) => refs,
        Err(err) => return storage_error_response(err),
    };
    match storage.remove(&partition, &refs).await {
        Ok(removed) => Json(RemoveResponse {
            removed: removed.into_iter().map(|r| r.to_string()).collect(),
        })
        .into_response(),
        Err(err) => storage_error_response(err),
    }
}

/// Legacy single-blob `PUT /camli/<blobref>`; no longer part of the
/// protocol but old clients still send it.
pub async fn legacy_put(
    storage: Arc<dyn Storage>,
    partition: Arc<Partition>,
    blob_ref: String,
    req: Request<Body>,
) -> Response {
    let blob = match BlobRef::parse(&blob_ref) {
        Ok(b) => b,
        Err(err) => return storage_error_response(err),
    };
    let data = match axum::body::to_bytes(req.into_body(), MAX_UPLOAD_SIZE as usize).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Blob exceeds maximum upload size.")
                .into_response()
        }
    };
    match storage.put(&partition, &blob, data).await {
        Ok(info) => Json(UploadResponse {
            received: vec![info],
            errors: Vec::new(),
            max_upload_size: MAX_UPLOAD_SIZE,
            upload_url: format!("{}/camli/upload", partition.urlbase),
        })
        .into_response(),
        Err(err) => storage_error_response(err),
    }
}
