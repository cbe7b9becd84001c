//! Storage backend abstraction.
//!
//! # Data Flow
//! ```text
//! Dispatcher selects handler
//!     → handler calls one Storage capability
//!     → backend performs the blocking I/O (disk, object store, indexer)
//!     → handler translates the result into an HTTP response
//! ```
//!
//! # Design Decisions
//! - One object-safe trait covers the whole capability set, so disk, an
//!   object store, or an indexer can all be bound to a partition
//! - Operations are partition-scoped; a put to a partition with mirrors
//!   also lands the blob in each queue partition (fan-out)
//! - Backends never see HTTP types; handlers own the translation

pub mod disk;
pub mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;

use crate::partition::Partition;

/// Errors from storage backends. Request handlers translate these into
/// response statuses; they never terminate the process.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid blob reference: {0:?}")]
    InvalidRef(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An opaque content-derived blob identifier, `<digestname>-<hexdigits>`.
///
/// The server never interprets the digest; it only refuses tokens that
/// could not be a blob reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let invalid = || StorageError::InvalidRef(s.to_string());
        let (digest, digits) = s.split_once('-').ok_or_else(invalid)?;
        if digest.is_empty()
            || digits.is_empty()
            || !digest
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            || !digits
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err(invalid());
        }
        Ok(BlobRef(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits after the digest name, used by disk backends for
    /// directory fan-out.
    pub fn digits(&self) -> &str {
        // parse() guarantees the separator exists
        &self.0[self.0.find('-').map(|i| i + 1).unwrap_or(0)..]
    }

    pub fn digest_name(&self) -> &str {
        &self.0[..self.0.find('-').unwrap_or(0)]
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Existence and size metadata for one blob, in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobInfo {
    #[serde(rename = "blobRef")]
    pub blob_ref: String,
    pub size: u64,
}

/// A stream of blob content chunks.
pub type BlobStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// The blob capability set. Any backend implementing this can be bound
/// to a partition: local disk, an object store, or an indexer acting as
/// a write-only sink.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream blob content by reference. Fails with `NotFound` before
    /// the stream starts if the blob does not exist.
    async fn fetch(&self, partition: &Partition, blob: &BlobRef) -> Result<BlobStream, StorageError>;

    /// List blobs in reference order, strictly after `after` when given,
    /// at most `limit` entries.
    async fn enumerate(
        &self,
        partition: &Partition,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<BlobInfo>, StorageError>;

    /// Return metadata for the subset of `blobs` that exist.
    async fn stat(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobInfo>, StorageError>;

    /// Write one blob. A put to a partition with mirrors also lands the
    /// blob in each mirror queue partition.
    async fn put(
        &self,
        partition: &Partition,
        blob: &BlobRef,
        data: Bytes,
    ) -> Result<BlobInfo, StorageError>;

    /// Delete blobs, returning the references actually removed.
    async fn remove(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobRef>, StorageError>;
}
