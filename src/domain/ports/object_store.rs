//! Object store port (spec §6's object-store layout).

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `bytes` to `path`, overwriting any existing object. Uploads
    /// are idempotent by path — retrying an upload to the same path never
    /// produces a different observable result once it succeeds.
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> DomainResult<()>;

    async fn get(&self, path: &str) -> DomainResult<Vec<u8>>;

    async fn exists(&self, path: &str) -> DomainResult<bool>;
}
