//! Local-disk storage backend.
//!
//! Layout under the storage root:
//! ```text
//! <root>/                              main partition
//! <root>/partition-<name>/             named partition
//! <dir>/<digest>/<xx>/<blobref>.dat    xx = first two hex digits
//! ```
//!
//! Writes go to a temp file in the final directory and are renamed into
//! place, so a crashed upload never leaves a half-written `.dat` file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use crate::partition::Partition;

use super::{BlobInfo, BlobRef, BlobStream, Storage, StorageError};

const BLOB_EXT: &str = "dat";

pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Open (creating if needed) a storage root. An unusable root is a
    /// fatal startup condition for the caller.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        if !root.is_dir() {
            return Err(StorageError::Io(std::io::Error::other(format!(
                "storage root {} is not a directory",
                root.display()
            ))));
        }
        Ok(DiskStorage { root })
    }

    fn partition_dir(&self, partition_name: &str) -> PathBuf {
        if partition_name.is_empty() {
            self.root.clone()
        } else {
            self.root.join(format!("partition-{partition_name}"))
        }
    }

    fn blob_path(&self, partition_name: &str, blob: &BlobRef) -> PathBuf {
        let digits = blob.digits();
        let fan_out = if digits.len() >= 2 { &digits[..2] } else { "00" };
        self.partition_dir(partition_name)
            .join(blob.digest_name())
            .join(fan_out)
            .join(format!("{blob}.{BLOB_EXT}"))
    }

    async fn write_one(
        &self,
        partition_name: &str,
        blob: &BlobRef,
        data: &Bytes,
    ) -> Result<(), StorageError> {
        let path = self.blob_path(partition_name, blob);
        let dir = path.parent().expect("blob path always has a parent");
        tokio::fs::create_dir_all(dir).await?;

        let tmp = dir.join(format!(".partial-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

fn walk_partition(dir: &Path) -> std::io::Result<Vec<(String, u64)>> {
    let mut found = Vec::new();
    let digests = match std::fs::read_dir(dir) {
        Ok(d) => d,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e),
    };
    for digest in digests {
        let digest = digest?;
        if !digest.file_type()?.is_dir() {
            continue;
        }
        // named partitions live beside the main partition's digest dirs
        if digest
            .file_name()
            .to_string_lossy()
            .starts_with("partition-")
        {
            continue;
        }
        for fan in std::fs::read_dir(digest.path())? {
            let fan = fan?;
            if !fan.file_type()?.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(fan.path())? {
                let entry = entry?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if let Some(blob_ref) = name.strip_suffix(&format!(".{BLOB_EXT}")) {
                    found.push((blob_ref.to_string(), entry.metadata()?.len()));
                }
            }
        }
    }
    Ok(found)
}

#[async_trait]
impl Storage for DiskStorage {
    async fn fetch(&self, partition: &Partition, blob: &BlobRef) -> Result<BlobStream, StorageError> {
        let path = self.blob_path(&partition.name, blob);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(blob.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn enumerate(
        &self,
        partition: &Partition,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<BlobInfo>, StorageError> {
        let dir = self.partition_dir(&partition.name);
        let after = after.map(str::to_string);
        let mut found = tokio::task::spawn_blocking(move || walk_partition(&dir))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        found.sort();
        let blobs = found
            .into_iter()
            .filter(|(r, _)| after.as_deref().is_none_or(|a| r.as_str() > a))
            .take(limit)
            .map(|(blob_ref, size)| BlobInfo { blob_ref, size })
            .collect();
        Ok(blobs)
    }

    async fn stat(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobInfo>, StorageError> {
        let mut out = Vec::new();
        for blob in blobs {
            match tokio::fs::metadata(self.blob_path(&partition.name, blob)).await {
                Ok(meta) => out.push(BlobInfo {
                    blob_ref: blob.to_string(),
                    size: meta.len(),
                }),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }

    async fn put(
        &self,
        partition: &Partition,
        blob: &BlobRef,
        data: Bytes,
    ) -> Result<BlobInfo, StorageError> {
        self.write_one(&partition.name, blob, &data).await?;
        for mirror in &partition.mirrors {
            self.write_one(&mirror.name, blob, &data).await?;
        }
        Ok(BlobInfo {
            blob_ref: blob.to_string(),
            size: data.len() as u64,
        })
    }

    async fn remove(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobRef>, StorageError> {
        let mut removed = Vec::new();
        for blob in blobs {
            match tokio::fs::remove_file(self.blob_path(&partition.name, blob)).await {
                Ok(()) => removed.push(blob.clone()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}
