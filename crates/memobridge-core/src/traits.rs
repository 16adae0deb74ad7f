//! Core traits for the remote note service.
//!
//! These traits define the boundary contract the HTTP client satisfies and
//! the batch engine and relay consume, enabling an in-memory service for
//! tests.

use async_trait::async_trait;
use tracing::debug;

use crate::batch::{join_batch, BatchResult};
use crate::error::{Error, Result};
use crate::models::*;

// =============================================================================
// NOTES
// =============================================================================

/// Note endpoints of the remote service.
#[async_trait]
pub trait NoteApi: Send + Sync {
    /// List notes matching a filter.
    async fn list_notes(&self, req: &ListNotesRequest) -> Result<Vec<Note>>;

    /// Fetch one note. Fails with `NotFound` when the remote reports absence.
    async fn get_note(&self, id: i64) -> Result<Note>;

    /// Create a note and return its id.
    async fn create_note(&self, req: &CreateNoteRequest) -> Result<i64>;

    /// Apply a partial update.
    async fn update_note(&self, id: i64, patch: &NotePatch) -> Result<()>;

    async fn delete_note(&self, id: i64) -> Result<()>;
}

// =============================================================================
// TAGS
// =============================================================================

/// Tag endpoints of the remote service.
#[async_trait]
pub trait TagApi: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<String>>;

    /// Create a tag. Creating an existing tag is not an error.
    async fn create_tag(&self, name: &str) -> Result<()>;

    /// Issue the remote delete without checking existence first.
    async fn remove_tag(&self, name: &str) -> Result<()>;

    /// Delete a tag, failing with `NotFound` if it is not listed at call time.
    ///
    /// The existence check and the delete are two separate calls; a tag
    /// created or removed in between is not accounted for.
    async fn delete_tag(&self, name: &str) -> Result<()> {
        let tags = self.list_tags().await?;
        if !tags.iter().any(|t| t == name) {
            debug!(tag = name, "Tag not listed, skipping remote delete");
            return Err(Error::NotFound(format!("tag {}", name)));
        }
        self.remove_tag(name).await
    }
}

// =============================================================================
// RESOURCES
// =============================================================================

/// Resource (attachment) endpoints of the remote service.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Upload raw bytes as a multipart blob.
    async fn upload_bytes(&self, bytes: Vec<u8>, meta: &UploadMeta) -> Result<i64>;

    /// Register an externally hosted file without transferring it.
    async fn upload_external_link(&self, url: &str, meta: &UploadMeta) -> Result<i64>;

    /// Fetch `url` and forward the stream as a blob upload.
    async fn upload_from_remote_stream(&self, url: &str, meta: &UploadMeta) -> Result<i64>;

    async fn list_resources(&self) -> Result<Vec<Resource>>;

    /// Issue the remote delete without checking existence first.
    async fn remove_resource(&self, id: i64) -> Result<()>;

    /// Delete a resource, failing with `NotFound` if it is not listed.
    async fn delete_resource(&self, id: i64) -> Result<()> {
        let resources = self.list_resources().await?;
        if !resources.iter().any(|r| r.id == id) {
            debug!(resource_id = id, "Resource not listed, skipping remote delete");
            return Err(Error::NotFound(format!("resource {}", id)));
        }
        self.remove_resource(id).await
    }

    /// Delete every resource no note links to. Deletions run concurrently
    /// and one failure does not abort the others.
    async fn delete_unlinked_resources(&self) -> Result<BatchResult<()>> {
        let resources = self.list_resources().await?;
        let unlinked: Vec<i64> = resources
            .iter()
            .filter(|r| r.is_unlinked())
            .map(|r| r.id)
            .collect();

        if unlinked.is_empty() {
            debug!("No unlinked resources");
            return Ok(BatchResult::empty());
        }

        debug!(target_count = unlinked.len(), "Deleting unlinked resources");
        Ok(join_batch(
            unlinked
                .into_iter()
                .map(|id| (id, self.remove_resource(id))),
        )
        .await)
    }
}

/// The full remote surface: notes, tags and resources.
pub trait MemosApi: NoteApi + TagApi + ResourceApi {}

impl<T: NoteApi + TagApi + ResourceApi> MemosApi for T {}
