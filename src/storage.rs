//! Object storage collaborator.
//!
//! The pipeline only needs "read the bytes at a location". Two implementations ship with
//! the crate: [`InMemoryObjectStorage`] for tests and embedding, and [`LocalDirStorage`]
//! which maps `bucket/key` onto a directory tree.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use crate::error::StorageError;
use crate::types::ObjectLocation;

/// Read access to stored objects.
pub trait ObjectStorage: Send + Sync {
    /// Fetch the full contents of an object. A missing object is an error.
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, StorageError>;
}

/// Objects held in memory, keyed by location.
#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: Mutex<HashMap<ObjectLocation, Vec<u8>>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) an object.
    pub fn put(&self, bucket: impl Into<String>, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(ObjectLocation::new(bucket, key), bytes.into());
        }
    }

    /// Builder-style [`Self::put`].
    pub fn with_object(
        self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.put(bucket, key, bytes);
        self
    }
}

impl ObjectStorage for InMemoryObjectStorage {
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.lock().map_err(|_| StorageError::Io {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
            source: std::io::Error::other("object map lock poisoned"),
        })?;
        objects
            .get(location)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
            })
    }
}

/// Objects stored as files under `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalDirStorage {
    root: PathBuf,
}

impl LocalDirStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location to a path, refusing keys that would escape the bucket directory.
    fn resolve(&self, location: &ObjectLocation) -> Option<PathBuf> {
        let bucket = Path::new(&location.bucket);
        let key = Path::new(&location.key);
        let contained = |p: &Path| p.components().all(|c| matches!(c, Component::Normal(_)));
        if location.bucket.is_empty() || !contained(bucket) || !contained(key) {
            return None;
        }
        Some(self.root.join(bucket).join(key))
    }
}

impl ObjectStorage for LocalDirStorage {
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, StorageError> {
        let not_found = || StorageError::NotFound {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
        };
        let path = self.resolve(location).ok_or_else(not_found)?;
        fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => not_found(),
            _ => StorageError::Io {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
                source,
            },
        })
    }
}
