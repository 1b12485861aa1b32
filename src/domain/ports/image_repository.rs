//! Persistence port for images and everything they own.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Image, ImageAssets};

#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Creates the image row in `pending` status. Called before uploads
    /// begin so that object-store paths (keyed by image id) are stable
    /// across retries.
    async fn create(&self, image: &Image) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<Image>>;

    /// Looks up the image already associated with a task, if any — used by
    /// the claim/retry path to find (or decide there is no) partial image
    /// to resume from.
    async fn get_by_task(&self, task_id: Uuid) -> DomainResult<Option<Image>>;

    /// Persists the full set of pipeline-produced assets and transitions
    /// the image to `ready`, in one transaction. Idempotent: re-committing
    /// the same task's assets replaces prior rows rather than duplicating
    /// them (spec's "at most one variant row per (image_id, preset)").
    async fn commit_ready(&self, image_id: Uuid, assets: &ImageAssets) -> DomainResult<()>;

    /// Marks an image associated with a permanently failed task for
    /// cleanup, per spec §4.2 step 7.
    async fn mark_for_cleanup(&self, image_id: Uuid) -> DomainResult<()>;
}
