//! Domain models shared across memobridge crates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::Error;

// =============================================================================
// NOTE ENUMS
// =============================================================================

/// Access level of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Private,
    Protected,
    Public,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Self::Private, Self::Protected, Self::Public];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Protected => "PROTECTED",
            Self::Public => "PUBLIC",
        }
    }

    /// Match a directive word exactly (case-sensitive, as typed in chat).
    pub fn from_directive(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == word)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_directive(&s.to_uppercase())
            .ok_or_else(|| Error::InvalidInput(format!("Invalid visibility: {}", s)))
    }
}

/// Lifecycle status of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    #[default]
    Normal,
    Archived,
}

impl RowStatus {
    pub const ALL: [RowStatus; 2] = [Self::Normal, Self::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn from_directive(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == word)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_directive(&s.to_uppercase())
            .ok_or_else(|| Error::InvalidInput(format!("Invalid row status: {}", s)))
    }
}

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// Kind of formatted span reported by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Hashtag,
    /// Any other span kind (bold, mention, url...). Ignored by the parser.
    #[serde(other)]
    Other,
}

/// A formatted span over the plain message text.
///
/// `offset` and `length` are measured in UTF-16 code units, the unit chat
/// platforms use for entity offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRange {
    pub offset: usize,
    pub length: usize,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
}

impl AnnotationRange {
    pub fn hashtag(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            kind: AnnotationKind::Hashtag,
        }
    }

    pub fn other(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            kind: AnnotationKind::Other,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

// =============================================================================
// PARSED NOTE
// =============================================================================

/// Structured note fields derived from one chat message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedNote {
    /// Canonical body with visibility/status/resource directives removed.
    pub body: String,
    pub tags: BTreeSet<String>,
    pub visibility: Visibility,
    pub status: RowStatus,
    /// Resource ids in the order they were referenced. Duplicates are kept.
    pub resource_ids: Vec<i64>,
}

// =============================================================================
// REMOTE ENTITIES
// =============================================================================

/// A note as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub visibility: Visibility,
    pub row_status: RowStatus,
    #[serde(default)]
    pub resource_ids: Vec<i64>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub created_ts: i64,
    #[serde(default)]
    pub updated_ts: i64,
}

impl Note {
    /// Tags referenced by the note body. Tags are not stored on the note,
    /// the remote derives them from hashtag tokens the same way.
    pub fn tags(&self) -> BTreeSet<String> {
        self.content
            .split_whitespace()
            .filter_map(crate::parse::hashtag_name)
            .map(str::to_string)
            .collect()
    }

    /// Human-facing link to the note on the remote web UI.
    pub fn link(&self, origin: &str) -> String {
        note_link(origin, self.id)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created_ts, 0).single()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.updated_ts, 0).single()
    }
}

/// Build `{origin}/m/{id}`.
pub fn note_link(origin: &str, id: i64) -> String {
    format!(
        "{}{}{}",
        origin.trim_end_matches('/'),
        defaults::NOTE_LINK_SEGMENT,
        id
    )
}

/// An uploaded attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub external_link: Option<String>,
    /// Number of notes referencing this resource.
    #[serde(default)]
    pub linked_note_count: i64,
}

impl Resource {
    pub fn is_unlinked(&self) -> bool {
        self.linked_note_count == 0
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Filter for listing notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListNotesRequest {
    pub status: RowStatus,
    pub tag: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub visibility: Option<Visibility>,
}

impl ListNotesRequest {
    pub fn with_status(status: RowStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn page(mut self, offset: i64, limit: i64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// Request for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateNoteRequest {
    pub content: String,
    pub visibility: Visibility,
    pub resource_ids: Vec<i64>,
}

impl From<&ParsedNote> for CreateNoteRequest {
    fn from(parsed: &ParsedNote) -> Self {
        Self {
            content: parsed.body.clone(),
            visibility: parsed.visibility,
            resource_ids: parsed.resource_ids.clone(),
        }
    }
}

/// Partial note update. Only `Some` fields reach the remote; omitted
/// fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub content: Option<String>,
    pub visibility: Option<Visibility>,
    pub resource_ids: Option<Vec<i64>>,
    pub status: Option<RowStatus>,
}

impl NotePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.visibility.is_none()
            && self.resource_ids.is_none()
            && self.status.is_none()
    }
}

impl From<&ParsedNote> for NotePatch {
    /// An edited message replaces every derived field.
    fn from(parsed: &ParsedNote) -> Self {
        Self {
            content: Some(parsed.body.clone()),
            visibility: Some(parsed.visibility),
            resource_ids: Some(parsed.resource_ids.clone()),
            status: Some(parsed.status),
        }
    }
}

/// Attachment upload metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMeta {
    pub filename: String,
    pub content_type: String,
}

impl UploadMeta {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Metadata with the default attachment content type.
    pub fn image(filename: impl Into<String>) -> Self {
        Self::new(filename, defaults::ATTACHMENT_CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(content: &str) -> Note {
        Note {
            id: 7,
            content: content.to_string(),
            visibility: Visibility::Private,
            row_status: RowStatus::Normal,
            resource_ids: vec![],
            pinned: false,
            created_ts: 1_678_672_993,
            updated_ts: 1_679_279_516,
        }
    }

    #[test]
    fn visibility_directives_are_case_sensitive() {
        assert_eq!(Visibility::from_directive("PUBLIC"), Some(Visibility::Public));
        assert_eq!(Visibility::from_directive("public"), None);
        assert_eq!(Visibility::from_directive("PUBLICK"), None);
    }

    #[test]
    fn visibility_from_str_is_lenient() {
        assert_eq!("protected".parse::<Visibility>().unwrap(), Visibility::Protected);
        assert!("hidden".parse::<Visibility>().is_err());
    }

    #[test]
    fn row_status_round_trips_through_serde() {
        let json = serde_json::to_string(&RowStatus::Archived).unwrap();
        assert_eq!(json, "\"ARCHIVED\"");
        let back: RowStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RowStatus::Archived);
    }

    #[test]
    fn annotation_kind_unknown_maps_to_other() {
        let range: AnnotationRange =
            serde_json::from_str(r#"{"offset":0,"length":4,"type":"bold"}"#).unwrap();
        assert_eq!(range.kind, AnnotationKind::Other);
        let range: AnnotationRange =
            serde_json::from_str(r#"{"offset":0,"length":4,"type":"hashtag"}"#).unwrap();
        assert_eq!(range.kind, AnnotationKind::Hashtag);
        assert_eq!(range.end(), 4);
    }

    #[test]
    fn note_tags_are_derived_from_body() {
        let n = note("#work notes about #rust and #work\n#later");
        let tags: Vec<_> = n.tags().into_iter().collect();
        assert_eq!(tags, vec!["later", "rust", "work"]);
    }

    #[test]
    fn note_link_uses_origin() {
        let n = note("x");
        assert_eq!(n.link("https://memos.example.com/"), "https://memos.example.com/m/7");
    }

    #[test]
    fn note_timestamps() {
        let n = note("x");
        assert_eq!(n.created_at().unwrap().timestamp(), 1_678_672_993);
    }

    #[test]
    fn note_patch_from_parsed_sets_every_field() {
        let parsed = ParsedNote {
            body: "hi".into(),
            visibility: Visibility::Public,
            status: RowStatus::Archived,
            resource_ids: vec![3],
            ..Default::default()
        };
        let patch = NotePatch::from(&parsed);
        assert_eq!(patch.content.as_deref(), Some("hi"));
        assert_eq!(patch.visibility, Some(Visibility::Public));
        assert_eq!(patch.resource_ids, Some(vec![3]));
        assert_eq!(patch.status, Some(RowStatus::Archived));
        assert!(NotePatch::default().is_empty());
    }

    #[test]
    fn resource_unlinked() {
        let r = Resource {
            id: 1,
            filename: "a.png".into(),
            content_type: "image/png".into(),
            size: 10,
            external_link: None,
            linked_note_count: 0,
        };
        assert!(r.is_unlinked());
    }
}
