//! In-memory storage backend.
//!
//! Used by tests and as the sink behind the dev indexer mount; proves
//! the router never depends on a concrete backend type.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use crate::partition::Partition;

use super::{BlobInfo, BlobRef, BlobStream, Storage, StorageError};

#[derive(Default)]
pub struct MemoryStorage {
    // partition name -> blob ref -> content
    partitions: RwLock<HashMap<String, BTreeMap<String, Bytes>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs held for a partition. Test helper.
    pub fn len(&self, partition_name: &str) -> usize {
        self.partitions
            .read()
            .expect("storage lock poisoned")
            .get(partition_name)
            .map_or(0, |m| m.len())
    }

    pub fn is_empty(&self, partition_name: &str) -> bool {
        self.len(partition_name) == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn fetch(&self, partition: &Partition, blob: &BlobRef) -> Result<BlobStream, StorageError> {
        let data = self
            .partitions
            .read()
            .expect("storage lock poisoned")
            .get(&partition.name)
            .and_then(|m| m.get(blob.as_str()).cloned())
            .ok_or_else(|| StorageError::NotFound(blob.to_string()))?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn enumerate(
        &self,
        partition: &Partition,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<BlobInfo>, StorageError> {
        let guard = self.partitions.read().expect("storage lock poisoned");
        let Some(blobs) = guard.get(&partition.name) else {
            return Ok(Vec::new());
        };
        Ok(blobs
            .iter()
            .filter(|(r, _)| after.is_none_or(|a| r.as_str() > a))
            .take(limit)
            .map(|(blob_ref, data)| BlobInfo {
                blob_ref: blob_ref.clone(),
                size: data.len() as u64,
            })
            .collect())
    }

    async fn stat(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobInfo>, StorageError> {
        let guard = self.partitions.read().expect("storage lock poisoned");
        let empty = BTreeMap::new();
        let held = guard.get(&partition.name).unwrap_or(&empty);
        Ok(blobs
            .iter()
            .filter_map(|b| {
                held.get(b.as_str()).map(|data| BlobInfo {
                    blob_ref: b.to_string(),
                    size: data.len() as u64,
                })
            })
            .collect())
    }

    async fn put(
        &self,
        partition: &Partition,
        blob: &BlobRef,
        data: Bytes,
    ) -> Result<BlobInfo, StorageError> {
        let size = data.len() as u64;
        let mut guard = self.partitions.write().expect("storage lock poisoned");
        guard
            .entry(partition.name.clone())
            .or_default()
            .insert(blob.to_string(), data.clone());
        for mirror in &partition.mirrors {
            guard
                .entry(mirror.name.clone())
                .or_default()
                .insert(blob.to_string(), data.clone());
        }
        Ok(BlobInfo {
            blob_ref: blob.to_string(),
            size,
        })
    }

    async fn remove(
        &self,
        partition: &Partition,
        blobs: &[BlobRef],
    ) -> Result<Vec<BlobRef>, StorageError> {
        let mut guard = self.partitions.write().expect("storage lock poisoned");
        let Some(held) = guard.get_mut(&partition.name) else {
            return Ok(Vec::new());
        };
        Ok(blobs
            .iter()
            .filter(|b| held.remove(b.as_str()).is_some())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::RegistryBuilder;

    fn blob(s: &str) -> BlobRef {
        BlobRef::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_put_stat_remove() {
        let store = MemoryStorage::new();
        let reg = RegistryBuilder::new().finalize("http://localhost");
        let main = reg.main();

        let r = blob("sha1-aa11");
        store.put(&main, &r, Bytes::from_static(b"abc")).await.unwrap();

        let infos = store.stat(&main, std::slice::from_ref(&r)).await.unwrap();
        assert_eq!(infos, vec![BlobInfo { blob_ref: "sha1-aa11".into(), size: 3 }]);

        let removed = store.remove(&main, std::slice::from_ref(&r)).await.unwrap();
        assert_eq!(removed, vec![r.clone()]);
        assert!(store.stat(&main, &[r]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mirror_fan_out() {
        let store = MemoryStorage::new();
        let mut b = RegistryBuilder::new();
        b.build_mirrors("q").unwrap();
        let reg = b.finalize("http://localhost");

        store
            .put(&reg.main(), &blob("sha1-bb22"), Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert_eq!(store.len(""), 1);
        assert_eq!(store.len("q"), 1);
    }
}
