//! Incoming chat messages to remote notes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use memobridge_client::{ClientConfig, Credential, MemosClient};
use memobridge_core::{
    parse_annotated, parse_plain, AnnotationRange, CreateNoteRequest, Error, MemosApi, NoteApi,
    NotePatch, ParsedNote, ResourceApi, Result, RowStatus, UploadMeta,
};

use crate::media_group::{GroupKey, MediaGroups};
use crate::session::SessionStore;

/// Builds a remote API handle from a session credential.
pub trait Connector: Send + Sync {
    type Api: MemosApi;

    fn connect(&self, credential: &Credential) -> Result<Self::Api>;
}

/// Connects over HTTP with a shared client configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: ClientConfig,
}

impl HttpConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    type Api = MemosClient;

    fn connect(&self, credential: &Credential) -> Result<MemosClient> {
        MemosClient::with_credential(credential.clone(), self.config.clone())
    }
}

/// The photo message a text message replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub message_id: i64,
    pub media_group_id: Option<String>,
}

/// A chat message as handed over by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub session: String,
    pub message_id: i64,
    pub text: String,
    /// Markup rendering of `text`. Empty when the transport has none.
    #[serde(default)]
    pub markup: String,
    #[serde(default)]
    pub annotations: Option<Vec<AnnotationRange>>,
    #[serde(default)]
    pub reply_to: Option<ReplyTarget>,
}

impl IncomingMessage {
    /// Annotated parse when markup is available, plain tokenizing otherwise.
    pub fn parse(&self) -> Result<ParsedNote> {
        if self.markup.is_empty() {
            return Ok(parse_plain(&self.text));
        }
        parse_annotated(&self.text, &self.markup, self.annotations.as_deref())
    }
}

/// A created or updated note.
///
/// `warnings` lists the follow-up steps that failed after the note itself
/// was written. The note and its message mapping stand regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedNote {
    pub id: i64,
    pub link: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Relays messages of bound sessions to their note service.
pub struct NoteRelay<S, C> {
    sessions: S,
    connector: C,
    media: MediaGroups,
}

impl<S: SessionStore, C: Connector> NoteRelay<S, C> {
    pub fn new(sessions: S, connector: C) -> Self {
        Self {
            sessions,
            connector,
            media: MediaGroups::new(),
        }
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn media(&self) -> &MediaGroups {
        &self.media
    }

    async fn session_api(&self, session: &str) -> Result<(Credential, C::Api)> {
        let raw = self
            .sessions
            .credential(session)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", session)))?;
        let credential = Credential::parse(&raw)?;
        let api = self.connector.connect(&credential)?;
        Ok((credential, api))
    }

    /// Create a note from a new message.
    ///
    /// A reply to a photo message also attaches the photos recorded for that
    /// message's group, ahead of any `#RES` ids in the text. The group is
    /// released once the note exists.
    ///
    /// Errors only when nothing was created. Once the note exists the
    /// message is mapped to it, and failures of the status update or tag
    /// creation are returned as warnings.
    #[instrument(skip(self, msg), fields(subsystem = "relay", component = "relay", op = "publish", session = %msg.session, message_id = msg.message_id))]
    pub async fn publish(&self, msg: &IncomingMessage) -> Result<PublishedNote> {
        let (credential, api) = self.session_api(&msg.session).await?;
        let parsed = msg.parse()?;

        let group = msg
            .reply_to
            .as_ref()
            .map(|r| GroupKey::for_photo(r.media_group_id.as_deref(), r.message_id));
        let mut resource_ids = group
            .as_ref()
            .map(|key| self.media.peek(&msg.session, key))
            .unwrap_or_default();
        resource_ids.extend(parsed.resource_ids.iter().copied());

        let id = api
            .create_note(&CreateNoteRequest {
                content: parsed.body.clone(),
                visibility: parsed.visibility,
                resource_ids,
            })
            .await?;
        if let Some(key) = group {
            self.media.take(&msg.session, &key);
        }

        // The note exists from here on, so later failures become warnings
        let mut warnings = Vec::new();
        if let Err(e) = self
            .sessions
            .remember_note(&msg.session, msg.message_id, id)
            .await
        {
            warn!(note_id = id, error = %e, "Failed to remember message note");
            warnings.push(format!("remember note: {}", e));
        }

        // Creation has no status field
        if parsed.status != RowStatus::Normal {
            let patch = NotePatch {
                status: Some(parsed.status),
                ..Default::default()
            };
            if let Err(e) = api.update_note(id, &patch).await {
                warn!(note_id = id, error = %e, "Failed to set note status");
                warnings.push(format!("set status {}: {}", parsed.status, e));
            }
        }

        warnings.extend(create_tags(&api, &parsed.tags).await);

        info!(
            note_id = id,
            tag_count = parsed.tags.len(),
            warning_count = warnings.len(),
            "Published note"
        );
        Ok(PublishedNote {
            id,
            link: credential.note_link(id),
            warnings,
        })
    }

    /// Re-parse an edited message and update the note it produced.
    ///
    /// Resource ids are only replaced when the edited text names some, so
    /// editing the caption of a photo note keeps its photos.
    #[instrument(skip(self, msg), fields(subsystem = "relay", component = "relay", op = "apply_edit", session = %msg.session, message_id = msg.message_id))]
    pub async fn apply_edit(&self, msg: &IncomingMessage) -> Result<PublishedNote> {
        let (credential, api) = self.session_api(&msg.session).await?;
        let id = self
            .sessions
            .note_for_message(&msg.session, msg.message_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("note for message {}", msg.message_id)))?;

        let parsed = msg.parse()?;
        let mut patch = NotePatch::from(&parsed);
        if parsed.resource_ids.is_empty() {
            patch.resource_ids = None;
        }
        api.update_note(id, &patch).await?;
        let warnings = create_tags(&api, &parsed.tags).await;

        info!(note_id = id, warning_count = warnings.len(), "Applied edit");
        Ok(PublishedNote {
            id,
            link: credential.note_link(id),
            warnings,
        })
    }

    /// Forward a photo from the transport to the note service and hold its
    /// id for the reply that will claim it.
    #[instrument(skip(self, url, meta), fields(subsystem = "relay", component = "relay", op = "attach_photo"))]
    pub async fn attach_photo(
        &self,
        session: &str,
        message_id: i64,
        media_group_id: Option<&str>,
        url: &str,
        meta: &UploadMeta,
    ) -> Result<i64> {
        let (_, api) = self.session_api(session).await?;
        let id = api.upload_from_remote_stream(url, meta).await?;
        self.media
            .record(session, GroupKey::for_photo(media_group_id, message_id), id);
        info!(resource_id = id, "Attached photo");
        Ok(id)
    }
}

/// Create every tag, returning one warning per failure.
async fn create_tags<A: MemosApi>(api: &A, tags: &BTreeSet<String>) -> Vec<String> {
    let mut warnings = Vec::new();
    for tag in tags {
        match api.create_tag(tag).await {
            Ok(()) => debug!(tag = tag.as_str(), "Created tag"),
            Err(e) => {
                warn!(tag = tag.as_str(), error = %e, "Failed to create tag");
                warnings.push(format!("create tag {}: {}", tag, e));
            }
        }
    }
    warnings
}
