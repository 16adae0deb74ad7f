//! Wire types for the remote note API.

use memobridge_core::{Note, Resource, RowStatus, Visibility};
use serde::{Deserialize, Serialize};

/// Every response wraps its payload in `{"data": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Created {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireNote {
    pub id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub row_status: RowStatus,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub created_ts: i64,
    #[serde(default)]
    pub updated_ts: i64,
    #[serde(default)]
    pub resource_list: Vec<WireResourceRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResourceRef {
    pub id: i64,
}

impl From<WireNote> for Note {
    fn from(w: WireNote) -> Self {
        Note {
            id: w.id,
            content: w.content,
            visibility: w.visibility,
            row_status: w.row_status,
            resource_ids: w.resource_list.into_iter().map(|r| r.id).collect(),
            pinned: w.pinned,
            created_ts: w.created_ts,
            updated_ts: w.updated_ts,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireResource {
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default, rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default, alias = "linkedMemoAmount")]
    pub linked_note_count: i64,
}

impl From<WireResource> for Resource {
    fn from(w: WireResource) -> Self {
        Resource {
            id: w.id,
            filename: w.filename,
            content_type: w.content_type,
            size: w.size,
            external_link: w.external_link.filter(|l| !l.is_empty()),
            linked_note_count: w.linked_note_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNoteBody<'a> {
    pub content: &'a str,
    pub visibility: Visibility,
    pub resource_id_list: &'a [i64],
}

/// Only fields that are `Some` are serialized.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatchNoteBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id_list: Option<&'a [i64]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_status: Option<RowStatus>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TagBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExternalLinkBody<'a> {
    pub filename: &'a str,
    pub external_link: &'a str,
    #[serde(rename = "type")]
    pub content_type: &'a str,
}
