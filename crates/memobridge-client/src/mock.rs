//! In-memory note service for deterministic testing.
//!
//! Implements the same traits as [`crate::MemosClient`] against local state,
//! records every call, and can be told to fail specific operations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use memobridge_client::mock::MockMemosService;
//! use memobridge_core::{NoteApi, NotePatch, Visibility};
//!
//! #[tokio::test]
//! async fn test_update_failure_is_reported() {
//!     let service = MockMemosService::new()
//!         .with_note(1, "first #inbox")
//!         .fail_update(1);
//!
//!     let err = service
//!         .update_note(1, &NotePatch::visibility(Visibility::Public))
//!         .await
//!         .unwrap_err();
//!     assert_eq!(err.status(), Some(500));
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use memobridge_core::{
    CreateNoteRequest, Error, ListNotesRequest, Note, NoteApi, NotePatch, Resource, ResourceApi,
    Result, RowStatus, TagApi, UploadMeta, Visibility,
};

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListNotes(ListNotesRequest),
    GetNote(i64),
    CreateNote(CreateNoteRequest),
    UpdateNote(i64, NotePatch),
    DeleteNote(i64),
    ListTags,
    CreateTag(String),
    RemoveTag(String),
    UploadBytes { filename: String, size: usize },
    UploadExternalLink(String),
    UploadFromRemoteStream(String),
    ListResources,
    RemoveResource(i64),
}

impl MockCall {
    /// True for calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            MockCall::ListNotes(_)
                | MockCall::GetNote(_)
                | MockCall::ListTags
                | MockCall::ListResources
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    notes: BTreeMap<i64, Note>,
    tags: BTreeSet<String>,
    resources: BTreeMap<i64, Resource>,
    next_id: i64,
    failing_updates: HashSet<i64>,
    failing_resource_deletes: HashSet<i64>,
    failing_tag_creates: HashSet<String>,
    ignore_offset: bool,
    latency_ms: u64,
    calls: Vec<MockCall>,
}

impl MockState {
    fn allocate_id(&mut self) -> i64 {
        let max_seen = self
            .notes
            .keys()
            .chain(self.resources.keys())
            .copied()
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max_seen) + 1;
        self.next_id
    }

    fn register_tags(&mut self, content: &str) {
        let draft = note_with(0, content);
        self.tags.extend(draft.tags());
    }
}

fn note_with(id: i64, content: &str) -> Note {
    Note {
        id,
        content: content.to_string(),
        visibility: Visibility::Private,
        row_status: RowStatus::Normal,
        resource_ids: Vec::new(),
        pinned: false,
        created_ts: 0,
        updated_ts: 0,
    }
}

fn injected_failure(what: String) -> Error {
    Error::rejected(500, format!("injected failure for {}", what))
}

/// Mock note service backed by shared in-memory state.
///
/// Clones share state, so a clone handed to the code under test can be
/// inspected afterwards through the original.
#[derive(Clone, Default)]
pub struct MockMemosService {
    state: Arc<Mutex<MockState>>,
}

impl MockMemosService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate(&self, call: MockCall) {
        let latency = {
            let mut state = self.state();
            state.calls.push(call);
            state.latency_ms
        };
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    /// Seed a normal, private note. Its hashtags are registered as tags.
    pub fn with_note(self, id: i64, content: &str) -> Self {
        self.with_full_note(note_with(id, content))
    }

    /// Seed a note with every field supplied.
    pub fn with_full_note(self, note: Note) -> Self {
        {
            let mut state = self.state();
            state.register_tags(&note.content);
            state.notes.insert(note.id, note);
        }
        self
    }

    /// Seed a tag with no notes referencing it.
    pub fn with_tag(self, name: &str) -> Self {
        self.state().tags.insert(name.to_string());
        self
    }

    pub fn with_resource(self, id: i64, filename: &str, linked_note_count: i64) -> Self {
        self.state().resources.insert(
            id,
            Resource {
                id,
                filename: filename.to_string(),
                content_type: "image/png".to_string(),
                size: 0,
                external_link: None,
                linked_note_count,
            },
        );
        self
    }

    /// Serve every list from the first row, like servers that drop `offset`.
    pub fn ignore_offset(self) -> Self {
        self.state().ignore_offset = true;
        self
    }

    /// Make every update of note `id` fail with a 500 rejection.
    pub fn fail_update(self, id: i64) -> Self {
        self.state().failing_updates.insert(id);
        self
    }

    /// Make every delete of resource `id` fail with a 500 rejection.
    pub fn fail_resource_delete(self, id: i64) -> Self {
        self.state().failing_resource_deletes.insert(id);
        self
    }

    /// Make creating tag `name` fail with a 500 rejection.
    pub fn fail_tag_create(self, name: &str) -> Self {
        self.state().failing_tag_creates.insert(name.to_string());
        self
    }

    /// Delay every call by `latency_ms` before it takes effect.
    pub fn with_latency_ms(self, latency_ms: u64) -> Self {
        self.state().latency_ms = latency_ms;
        self
    }

    /// All recorded calls in arrival order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear()
    }

    /// Recorded update calls in arrival order.
    pub fn updates(&self) -> Vec<(i64, NotePatch)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::UpdateNote(id, patch) => Some((*id, patch.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn mutation_count(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_mutation()).count()
    }

    pub fn note(&self, id: i64) -> Option<Note> {
        self.state().notes.get(&id).cloned()
    }

    pub fn tags(&self) -> Vec<String> {
        self.state().tags.iter().cloned().collect()
    }

    pub fn resource_ids(&self) -> Vec<i64> {
        self.state().resources.keys().copied().collect()
    }
}

#[async_trait]
impl NoteApi for MockMemosService {
    async fn list_notes(&self, req: &ListNotesRequest) -> Result<Vec<Note>> {
        self.simulate(MockCall::ListNotes(req.clone())).await;
        let state = self.state();
        let offset = if state.ignore_offset {
            0
        } else {
            req.offset.unwrap_or(0).max(0) as usize
        };
        let limit = req.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);

        Ok(state
            .notes
            .values()
            .filter(|n| n.row_status == req.status)
            .filter(|n| req.visibility.map_or(true, |v| n.visibility == v))
            .filter(|n| req.tag.as_ref().map_or(true, |t| n.tags().contains(t)))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_note(&self, id: i64) -> Result<Note> {
        self.simulate(MockCall::GetNote(id)).await;
        self.state()
            .notes
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))
    }

    async fn create_note(&self, req: &CreateNoteRequest) -> Result<i64> {
        self.simulate(MockCall::CreateNote(req.clone())).await;
        let mut state = self.state();
        let id = state.allocate_id();
        let mut note = note_with(id, &req.content);
        note.visibility = req.visibility;
        note.resource_ids = req.resource_ids.clone();
        state.register_tags(&req.content);
        state.notes.insert(id, note);
        Ok(id)
    }

    async fn update_note(&self, id: i64, patch: &NotePatch) -> Result<()> {
        self.simulate(MockCall::UpdateNote(id, patch.clone())).await;
        let mut state = self.state();
        if state.failing_updates.contains(&id) {
            return Err(injected_failure(format!("note {}", id)));
        }
        let note = state
            .notes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))?;

        if let Some(ref content) = patch.content {
            note.content = content.clone();
        }
        if let Some(visibility) = patch.visibility {
            note.visibility = visibility;
        }
        if let Some(ref ids) = patch.resource_ids {
            note.resource_ids = ids.clone();
        }
        if let Some(status) = patch.status {
            note.row_status = status;
        }
        note.updated_ts += 1;

        let content = note.content.clone();
        state.register_tags(&content);
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> Result<()> {
        self.simulate(MockCall::DeleteNote(id)).await;
        self.state()
            .notes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))
    }
}

#[async_trait]
impl TagApi for MockMemosService {
    async fn list_tags(&self) -> Result<Vec<String>> {
        self.simulate(MockCall::ListTags).await;
        Ok(self.tags())
    }

    async fn create_tag(&self, name: &str) -> Result<()> {
        self.simulate(MockCall::CreateTag(name.to_string())).await;
        let mut state = self.state();
        if state.failing_tag_creates.contains(name) {
            return Err(injected_failure(format!("tag {}", name)));
        }
        state.tags.insert(name.to_string());
        Ok(())
    }

    async fn remove_tag(&self, name: &str) -> Result<()> {
        self.simulate(MockCall::RemoveTag(name.to_string())).await;
        self.state().tags.remove(name);
        Ok(())
    }
}

#[async_trait]
impl ResourceApi for MockMemosService {
    async fn upload_bytes(&self, bytes: Vec<u8>, meta: &UploadMeta) -> Result<i64> {
        self.simulate(MockCall::UploadBytes {
            filename: meta.filename.clone(),
            size: bytes.len(),
        })
        .await;
        let mut state = self.state();
        let id = state.allocate_id();
        state.resources.insert(
            id,
            Resource {
                id,
                filename: meta.filename.clone(),
                content_type: meta.content_type.clone(),
                size: bytes.len() as i64,
                external_link: None,
                linked_note_count: 0,
            },
        );
        Ok(id)
    }

    async fn upload_external_link(&self, url: &str, meta: &UploadMeta) -> Result<i64> {
        self.simulate(MockCall::UploadExternalLink(url.to_string()))
            .await;
        let mut state = self.state();
        let id = state.allocate_id();
        state.resources.insert(
            id,
            Resource {
                id,
                filename: meta.filename.clone(),
                content_type: meta.content_type.clone(),
                size: 0,
                external_link: Some(url.to_string()),
                linked_note_count: 0,
            },
        );
        Ok(id)
    }

    async fn upload_from_remote_stream(&self, url: &str, meta: &UploadMeta) -> Result<i64> {
        self.simulate(MockCall::UploadFromRemoteStream(url.to_string()))
            .await;
        let mut state = self.state();
        let id = state.allocate_id();
        state.resources.insert(
            id,
            Resource {
                id,
                filename: meta.filename.clone(),
                content_type: meta.content_type.clone(),
                size: 0,
                external_link: None,
                linked_note_count: 0,
            },
        );
        Ok(id)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        self.simulate(MockCall::ListResources).await;
        Ok(self.state().resources.values().cloned().collect())
    }

    async fn remove_resource(&self, id: i64) -> Result<()> {
        self.simulate(MockCall::RemoveResource(id)).await;
        let mut state = self.state();
        if state.failing_resource_deletes.contains(&id) {
            return Err(injected_failure(format!("resource {}", id)));
        }
        state
            .resources
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("resource {}", id)))
    }
}
