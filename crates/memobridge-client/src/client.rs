//! HTTP implementation of the remote note service traits.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use memobridge_core::{
    defaults, CreateNoteRequest, Error, ListNotesRequest, Note, NoteApi, NotePatch, Resource,
    ResourceApi, Result, TagApi, UploadMeta,
};

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{status_error, transport_error};
use crate::types::*;

/// Client for one bound credential.
#[derive(Clone)]
pub struct MemosClient {
    http: Client,
    credential: Credential,
    config: ClientConfig,
}

impl MemosClient {
    /// Validate `credential` and build a client.
    pub fn new(credential: &str, config: ClientConfig) -> Result<Self> {
        Self::with_credential(Credential::parse(credential)?, config)
    }

    pub fn with_credential(credential: Credential, config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone());

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        debug!(origin = credential.origin(), "Initialized note client");

        Ok(Self {
            http,
            credential,
            config,
        })
    }

    /// Create from `MEMOBRIDGE_OPEN_API` and the client environment overrides.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(defaults::OPEN_API_ENV)
            .map_err(|_| Error::Config(format!("{} is not set", defaults::OPEN_API_ENV)))?;
        Self::new(&raw, ClientConfig::from_env())
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.credential.endpoint(path)
    }

    /// Send a request and check for HTTP 200.
    async fn dispatch(&self, req: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let start = Instant::now();
        let response = req.send().await.map_err(|e| transport_error(e, what))?;
        let status = response.status();
        debug!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "{} responded",
            what
        );

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, what));
        }
        Ok(response)
    }

    /// Send a request and decode the `data` field of the response.
    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let response = self.dispatch(req, what).await?;
        let bytes = response.bytes().await.map_err(|e| transport_error(e, what))?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(|e| {
            Error::Serialization(format!("Failed to parse {} response: {}", what, e))
        })?;
        Ok(envelope.data)
    }

    /// Send a request whose payload is not needed.
    async fn execute(&self, req: RequestBuilder, what: &str) -> Result<()> {
        self.dispatch(req, what).await.map(|_| ())
    }

    async fn upload_part(&self, part: Part) -> Result<i64> {
        let form = Form::new().part(defaults::UPLOAD_FIELD, part);
        let req = self
            .http
            .post(self.url(defaults::RESOURCE_BLOB_PATH))
            .multipart(form);
        let created: Created = self.fetch(req, "resource upload").await?;
        info!(resource_id = created.id, "Uploaded resource");
        Ok(created.id)
    }
}

fn file_part(part: Part, meta: &UploadMeta) -> Result<Part> {
    part.file_name(meta.filename.clone())
        .mime_str(&meta.content_type)
        .map_err(|e| Error::InvalidInput(format!("Invalid content type {}: {}", meta.content_type, e)))
}

#[async_trait]
impl NoteApi for MemosClient {
    #[instrument(skip(self, req), fields(subsystem = "client", component = "memos", op = "list_notes", tag = ?req.tag))]
    async fn list_notes(&self, req: &ListNotesRequest) -> Result<Vec<Note>> {
        let mut params: Vec<(&str, String)> = vec![("rowStatus", req.status.to_string())];
        if let Some(ref tag) = req.tag {
            params.push(("tag", tag.clone()));
        }
        if let Some(offset) = req.offset {
            params.push(("offset", offset.to_string()));
        }
        if let Some(limit) = req.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(visibility) = req.visibility {
            params.push(("visibility", visibility.to_string()));
        }

        let http_req = self
            .http
            .get(self.url(defaults::NOTE_PATH))
            .query(&params);
        let notes: Vec<WireNote> = self.fetch(http_req, "note list").await?;
        debug!(result_count = notes.len(), "Listed notes");
        Ok(notes.into_iter().map(Note::from).collect())
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "memos", op = "get_note"))]
    async fn get_note(&self, id: i64) -> Result<Note> {
        let path = format!("{}/{}", defaults::NOTE_PATH, id);
        let note: WireNote = self
            .fetch(self.http.get(self.url(&path)), &format!("note {}", id))
            .await?;
        Ok(note.into())
    }

    #[instrument(skip(self, req), fields(subsystem = "client", component = "memos", op = "create_note"))]
    async fn create_note(&self, req: &CreateNoteRequest) -> Result<i64> {
        let body = CreateNoteBody {
            content: &req.content,
            visibility: req.visibility,
            resource_id_list: &req.resource_ids,
        };
        let http_req = self.http.post(self.url(defaults::NOTE_PATH)).json(&body);
        let created: Created = self.fetch(http_req, "note create").await?;
        info!(note_id = created.id, "Created note");
        Ok(created.id)
    }

    #[instrument(skip(self, patch), fields(subsystem = "client", component = "memos", op = "update_note"))]
    async fn update_note(&self, id: i64, patch: &NotePatch) -> Result<()> {
        let body = PatchNoteBody {
            content: patch.content.as_deref(),
            visibility: patch.visibility,
            resource_id_list: patch.resource_ids.as_deref(),
            row_status: patch.status,
        };
        let path = format!("{}/{}", defaults::NOTE_PATH, id);
        self.execute(
            self.http.patch(self.url(&path)).json(&body),
            &format!("note {}", id),
        )
        .await
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "memos", op = "delete_note"))]
    async fn delete_note(&self, id: i64) -> Result<()> {
        let path = format!("{}/{}", defaults::NOTE_PATH, id);
        self.execute(self.http.delete(self.url(&path)), &format!("note {}", id))
            .await?;
        info!(note_id = id, "Deleted note");
        Ok(())
    }
}

#[async_trait]
impl TagApi for MemosClient {
    #[instrument(skip(self), fields(subsystem = "client", component = "memos", op = "list_tags"))]
    async fn list_tags(&self) -> Result<Vec<String>> {
        self.fetch(self.http.get(self.url(defaults::TAG_PATH)), "tag list")
            .await
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "memos", op = "create_tag"))]
    async fn create_tag(&self, name: &str) -> Result<()> {
        let req = self
            .http
            .post(self.url(defaults::TAG_PATH))
            .json(&TagBody { name });
        self.execute(req, &format!("tag {}", name)).await
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "memos", op = "remove_tag"))]
    async fn remove_tag(&self, name: &str) -> Result<()> {
        let req = self
            .http
            .post(self.url(defaults::TAG_DELETE_PATH))
            .json(&TagBody { name });
        self.execute(req, &format!("tag {}", name)).await?;
        info!(tag = name, "Deleted tag");
        Ok(())
    }
}

#[async_trait]
impl ResourceApi for MemosClient {
    #[instrument(skip(self, bytes, meta), fields(subsystem = "client", component = "memos", op = "upload_bytes", size = bytes.len()))]
    async fn upload_bytes(&self, bytes: Vec<u8>, meta: &UploadMeta) -> Result<i64> {
        let part = file_part(Part::bytes(bytes), meta)?;
        self.upload_part(part).await
    }

    #[instrument(skip(self, meta), fields(subsystem = "client", component = "memos", op = "upload_external_link"))]
    async fn upload_external_link(&self, url: &str, meta: &UploadMeta) -> Result<i64> {
        let body = ExternalLinkBody {
            filename: &meta.filename,
            external_link: url,
            content_type: &meta.content_type,
        };
        let req = self.http.post(self.url(defaults::RESOURCE_PATH)).json(&body);
        let created: Created = self.fetch(req, "resource link").await?;
        info!(resource_id = created.id, "Registered external resource");
        Ok(created.id)
    }

    #[instrument(skip(self, meta), fields(subsystem = "client", component = "memos", op = "upload_from_remote_stream"))]
    async fn upload_from_remote_stream(&self, url: &str, meta: &UploadMeta) -> Result<i64> {
        // The source URL belongs to the chat transport, not the note
        // service, so no credential query is attached.
        let what = format!("source {}", url);
        let source = self.dispatch(self.http.get(url), &what).await?;
        let part = match source.content_length() {
            Some(len) => Part::stream_with_length(reqwest::Body::from(source), len),
            None => Part::stream(reqwest::Body::from(source)),
        };
        self.upload_part(file_part(part, meta)?).await
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "memos", op = "list_resources"))]
    async fn list_resources(&self) -> Result<Vec<Resource>> {
        let resources: Vec<WireResource> = self
            .fetch(self.http.get(self.url(defaults::RESOURCE_PATH)), "resource list")
            .await?;
        Ok(resources.into_iter().map(Resource::from).collect())
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "memos", op = "remove_resource"))]
    async fn remove_resource(&self, id: i64) -> Result<()> {
        let path = format!("{}/{}", defaults::RESOURCE_PATH, id);
        self.execute(self.http.delete(self.url(&path)), &format!("resource {}", id))
            .await?;
        info!(resource_id = id, "Deleted resource");
        Ok(())
    }
}
