//! Blob storage collaborator backing artifact payloads.

use crate::error::PipelineError;
use crate::persistence::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Opaque reference to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub key: String,
}

/// Byte-level storage for dataset and model payloads. The filesystem
/// implementation below is the default; cloud object stores plug in behind
/// the same trait.
pub trait BlobStore: Send + Sync {
    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<BlobRef, PipelineError>;
    fn read_bytes(&self, blob: &BlobRef) -> Result<Vec<u8>, PipelineError>;
}

/// Filesystem blob store rooted at a directory. Keys are relative paths.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl BlobStore for FsBlobStore {
    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<BlobRef, PipelineError> {
        atomic_write(&self.resolve(key), bytes)?;
        Ok(BlobRef {
            key: key.to_string(),
        })
    }

    fn read_bytes(&self, blob: &BlobRef) -> Result<Vec<u8>, PipelineError> {
        let path = self.resolve(&blob.key);
        std::fs::read(&path)
            .map_err(|_| PipelineError::not_found(format!("blob {}", blob.key)))
    }
}

/// Serialize a value and store it under `key`.
pub fn write_json<T: serde::Serialize>(
    store: &dyn BlobStore,
    key: &str,
    value: &T,
) -> Result<BlobRef, PipelineError> {
    let bytes = serde_json::to_vec(value)?;
    store.write_bytes(key, &bytes)
}

/// Fetch and deserialize a stored value.
pub fn read_json<T: serde::de::DeserializeOwned>(
    store: &dyn BlobStore,
    blob: &BlobRef,
) -> Result<T, PipelineError> {
    let bytes = store.read_bytes(blob)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());

        let blob = store.write_bytes("run-1/raw.json", b"payload").unwrap();
        assert_eq!(store.read_bytes(&blob).unwrap(), b"payload");
    }

    #[test]
    fn test_read_missing_blob_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());
        let err = store
            .read_bytes(&BlobRef {
                key: "absent".into(),
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn test_json_helpers() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());

        let blob = write_json(&store, "run-1/values.json", &vec![1, 2, 3]).unwrap();
        let values: Vec<i32> = read_json(&store, &blob).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());

        store.write_bytes("k", b"old").unwrap();
        let blob = store.write_bytes("k", b"new").unwrap();
        assert_eq!(store.read_bytes(&blob).unwrap(), b"new");
    }
}
