//! Tag rename and bulk visibility over the remote note service.

use std::collections::HashSet;
use std::time::Instant;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use memobridge_core::{
    join_batch, BatchResult, BatchSummary, Error, ListNotesRequest, MemosApi, Note, NotePatch,
    Result, RowStatus, Visibility,
};

use crate::config::BatchConfig;
use crate::rewrite::rewrite_tag_tokens;
use crate::selection::{combine_targets, SelectionPolicy};

/// Tag step run after the rename fan-out joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStep {
    CreateNew,
    DeleteOld,
}

/// Outcome of [`BatchTools::rename_tag`].
#[derive(Debug)]
pub struct RenameReport {
    pub batch_id: Uuid,
    /// The old tag was not listed; nothing was touched.
    pub skipped: bool,
    /// One entry per note whose body changed.
    pub updates: BatchResult<()>,
    /// Notes returned by the tag filter whose body had no exact `#old` token.
    pub unchanged: Vec<i64>,
    pub tag_failures: Vec<(TagStep, Error)>,
}

impl RenameReport {
    fn skipped(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            skipped: true,
            updates: BatchResult::empty(),
            unchanged: Vec::new(),
            tag_failures: Vec::new(),
        }
    }

    /// True when every note update and every tag step succeeded.
    pub fn is_complete(&self) -> bool {
        self.updates.is_complete() && self.tag_failures.is_empty()
    }

    pub fn summary(&self) -> RenameSummary {
        RenameSummary {
            batch_id: self.batch_id.to_string(),
            skipped: self.skipped,
            updates: self.updates.summary(),
            unchanged: self.unchanged.clone(),
            tag_failures: self
                .tag_failures
                .iter()
                .map(|(step, e)| (*step, e.to_string()))
                .collect(),
        }
    }
}

/// Serializable view of a [`RenameReport`].
#[derive(Debug, Clone, Serialize)]
pub struct RenameSummary {
    pub batch_id: String,
    pub skipped: bool,
    pub updates: BatchSummary,
    pub unchanged: Vec<i64>,
    pub tag_failures: Vec<(TagStep, String)>,
}

/// Batch maintenance operations bound to one remote service.
pub struct BatchTools<A> {
    api: A,
    config: BatchConfig,
}

impl<A: MemosApi> BatchTools<A> {
    pub fn new(api: A, config: BatchConfig) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn statuses(&self) -> Vec<RowStatus> {
        if self.config.include_archived {
            vec![RowStatus::Normal, RowStatus::Archived]
        } else {
            vec![RowStatus::Normal]
        }
    }

    /// Every candidate note carrying `tag`, across the configured statuses
    /// and pages.
    async fn notes_tagged(&self, tag: &str) -> Result<Vec<Note>> {
        let mut notes = Vec::new();
        let mut seen = HashSet::new();
        for status in self.statuses() {
            let base = ListNotesRequest::with_status(status).tagged(tag);
            match self.config.page_size {
                None => notes.extend(
                    self.api
                        .list_notes(&base)
                        .await?
                        .into_iter()
                        .filter(|n| seen.insert(n.id)),
                ),
                Some(limit) => {
                    let mut offset = 0;
                    loop {
                        let page = self
                            .api
                            .list_notes(&base.clone().page(offset, limit))
                            .await?;
                        let fetched = page.len() as i64;
                        let before = notes.len();
                        notes.extend(page.into_iter().filter(|n| seen.insert(n.id)));
                        // A server that drops offset or limit repeats rows
                        if fetched < limit || notes.len() == before {
                            break;
                        }
                        offset += fetched;
                    }
                }
            }
        }
        debug!(tag, result_count = notes.len(), "Fetched candidate notes");
        Ok(notes)
    }

    /// Rename `#old` to `#new` in every note body carrying the old tag.
    ///
    /// Skips with no remote mutation when `old` is not listed. Otherwise
    /// updates run concurrently; `new` is created only after all of them
    /// settle, and `old` is deleted only when `delete_old` is set and the
    /// creation succeeded. Update and tag failures are collected in the
    /// report.
    #[instrument(skip(self), fields(subsystem = "batch", component = "tools", op = "rename_tag"))]
    pub async fn rename_tag(&self, old: &str, new: &str, delete_old: bool) -> Result<RenameReport> {
        let old = old.trim_start_matches('#');
        let new = new.trim_start_matches('#');
        if old.is_empty() || new.is_empty() {
            return Err(Error::InvalidInput("tag names must not be empty".to_string()));
        }
        if old == new {
            return Err(Error::InvalidInput(format!(
                "old and new tag are both {}",
                old
            )));
        }

        let batch_id = Uuid::now_v7();
        let start = Instant::now();

        let tags = self.api.list_tags().await?;
        if !tags.iter().any(|t| t == old) {
            warn!(%batch_id, tag = old, "Tag not found, skipping rename");
            return Ok(RenameReport::skipped(batch_id));
        }

        let mut rewrites = Vec::new();
        let mut unchanged = Vec::new();
        for note in self.notes_tagged(old).await? {
            match rewrite_tag_tokens(&note.content, old, new) {
                Some(body) => rewrites.push((note.id, NotePatch::content(body))),
                None => unchanged.push(note.id),
            }
        }
        debug!(
            %batch_id,
            target_count = rewrites.len(),
            unchanged = unchanged.len(),
            "Computed rename targets"
        );

        let updates = join_batch(
            rewrites
                .iter()
                .map(|(id, patch)| (*id, self.api.update_note(*id, patch))),
        )
        .await;

        let mut tag_failures = Vec::new();
        let created = match self.api.create_tag(new).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%batch_id, tag = new, error = %e, "Failed to create new tag");
                tag_failures.push((TagStep::CreateNew, e));
                false
            }
        };
        if delete_old && created {
            if let Err(e) = self.api.delete_tag(old).await {
                warn!(%batch_id, tag = old, error = %e, "Failed to delete old tag");
                tag_failures.push((TagStep::DeleteOld, e));
            }
        }

        let report = RenameReport {
            batch_id,
            skipped: false,
            updates,
            unchanged,
            tag_failures,
        };
        info!(
            %batch_id,
            result_count = report.updates.succeeded.len(),
            failed_count = report.updates.failed.len(),
            success = report.is_complete(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tag rename finished"
        );
        Ok(report)
    }

    /// Set `visibility` on every note the policy selects.
    ///
    /// Tags absent from the tag listing contribute no notes. An empty
    /// target set issues no mutation. Query failures abort before any
    /// update is dispatched; update failures are collected per note.
    #[instrument(skip(self, policy), fields(subsystem = "batch", component = "tools", op = "bulk_set_visibility", combine = %policy.combine))]
    pub async fn bulk_set_visibility(
        &self,
        policy: &SelectionPolicy,
        visibility: Visibility,
    ) -> Result<BatchResult<()>> {
        let batch_id = Uuid::now_v7();
        let start = Instant::now();

        if policy.is_empty() {
            debug!(%batch_id, "Empty tag sequence, nothing selected");
            return Ok(BatchResult::empty());
        }

        let known = self.api.list_tags().await?;
        let per_tag = try_join_all(policy.tag_keys.iter().map(|tag| {
            let listed = known.iter().any(|k| k == tag);
            async move {
                if !listed {
                    warn!(%batch_id, tag = tag.as_str(), "Tag not found, contributes no notes");
                    return Ok(Vec::new());
                }
                self.notes_tagged(tag)
                    .await
                    .map(|notes| notes.into_iter().map(|n| n.id).collect::<Vec<i64>>())
            }
        }))
        .await?;

        let targets = combine_targets(policy.combine, &per_tag);
        if targets.is_empty() {
            info!(%batch_id, "No notes selected, nothing to update");
            return Ok(BatchResult::empty());
        }
        debug!(%batch_id, target_count = targets.len(), "Dispatching visibility updates");

        let patch = NotePatch::visibility(visibility);
        let result = join_batch(
            targets
                .iter()
                .map(|id| (*id, self.api.update_note(*id, &patch))),
        )
        .await;

        info!(
            %batch_id,
            %visibility,
            result_count = result.succeeded.len(),
            failed_count = result.failed.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Bulk visibility finished"
        );
        Ok(result)
    }
}
