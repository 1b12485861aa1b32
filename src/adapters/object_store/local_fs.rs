//! Local-filesystem `ObjectStore` implementation. Paths are relative to a
//! configured root directory; parent directories are created on demand.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::object_store::ObjectStore;

pub struct LocalFsObjectStore {
    root: PathBuf,
}

impl LocalFsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> DomainResult<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute() || relative.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(DomainError::ObjectStoreError(format!("invalid object path: {path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalFsObjectStore {
    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> DomainResult<()> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| DomainError::ObjectStoreError(format!("create_dir_all {path}: {e}")))?;
        }
        tokio::fs::write(&full_path, bytes).await.map_err(|e| DomainError::ObjectStoreError(format!("write {path}: {e}")))
    }

    async fn get(&self, path: &str) -> DomainResult<Vec<u8>> {
        let full_path = self.resolve(path)?;
        tokio::fs::read(&full_path).await.map_err(|e| DomainError::ObjectStoreError(format!("read {path}: {e}")))
    }

    async fn exists(&self, path: &str) -> DomainResult<bool> {
        let full_path = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&full_path).await.map_err(|e| DomainError::ObjectStoreError(format!("stat {path}: {e}")))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsObjectStore::new(dir.path());

        store.put("images/abc/thumbnail.jpg", b"bytes", "image/jpeg").await.unwrap();
        assert!(store.exists("images/abc/thumbnail.jpg").await.unwrap());
        assert_eq!(store.get("images/abc/thumbnail.jpg").await.unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn missing_object_reports_not_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsObjectStore::new(dir.path());
        assert!(!store.exists("nope.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsObjectStore::new(dir.path());
        assert!(store.put("../escape.jpg", b"x", "image/jpeg").await.is_err());
    }
}
