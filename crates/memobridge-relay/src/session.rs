//! Session store: which credential a chat session is bound to, and which
//! note each of its messages produced.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use memobridge_client::Credential;
use memobridge_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Credential lookup keyed by session id, with explicit bind/unbind.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Bind `session` to `credential`, replacing any earlier binding.
    ///
    /// The credential shape is validated first; an invalid credential
    /// leaves the store untouched and fails with `InvalidCredential`.
    async fn bind(&self, session: &str, credential: &str) -> Result<()>;

    /// Forget the session. Returns `false` when it was not bound.
    async fn unbind(&self, session: &str) -> Result<bool>;

    async fn credential(&self, session: &str) -> Result<Option<String>>;

    /// Record that `message_id` produced `note_id`. Fails with `NotFound`
    /// for an unbound session.
    async fn remember_note(&self, session: &str, message_id: i64, note_id: i64) -> Result<()>;

    async fn note_for_message(&self, session: &str, message_id: i64) -> Result<Option<i64>>;
}

/// Everything stored for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub credential: String,
    /// Chat message id to note id.
    #[serde(default)]
    pub notes: BTreeMap<i64, i64>,
}

fn validate(credential: &str) -> Result<String> {
    Credential::parse(credential)?;
    Ok(credential.trim().to_string())
}

fn unbound(session: &str) -> Error {
    Error::NotFound(format!("session {}", session))
}

// =============================================================================
// FILE STORE
// =============================================================================

/// One JSON document per session under a directory.
///
/// Path format: `{dir}/{session}.json`. Session ids are restricted to ASCII
/// alphanumerics, `-` and `_`.
pub struct FileSessionStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store rooted at `MEMOBRIDGE_SESSION_DIR`, or `db` when unset.
    pub fn from_env() -> Self {
        let dir = std::env::var("MEMOBRIDGE_SESSION_DIR")
            .unwrap_or_else(|_| memobridge_core::defaults::SESSION_DIR.to_string());
        Self::new(dir)
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path(&self, session: &str) -> Result<PathBuf> {
        let valid = !session.is_empty()
            && session
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::InvalidInput(format!("invalid session id: {:?}", session)));
        }
        Ok(self.dir.join(format!("{}.json", session)))
    }

    async fn load(&self, session: &str) -> Result<Option<SessionRecord>> {
        let path = self.path(session)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, session: &str, record: &SessionRecord) -> Result<()> {
        let path = self.path(session)?;
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            warn!(dir = %self.dir.display(), error = %e, "session store: create_dir_all failed");
            e
        })?;

        // Atomic write: temp file + rename
        let temp_path = path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(record)?;

        // The record holds a secret, so the temp file is private before any
        // byte lands in it. A stale temp file keeps its old mode on open.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::OpenOptions::new()
                .write(true)
                .create(true)
                .mode(0o600)
                .open(&temp_path)
                .await?;
            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn bind(&self, session: &str, credential: &str) -> Result<()> {
        let credential = validate(credential)?;
        let _guard = self.write_lock.lock().await;
        let record = SessionRecord {
            credential,
            notes: BTreeMap::new(),
        };
        self.store(session, &record).await?;
        info!(session, "Session bound");
        Ok(())
    }

    async fn unbind(&self, session: &str) -> Result<bool> {
        let path = self.path(session)?;
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(session, "Session unbound");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(session, "Unbind requested for unknown session");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn credential(&self, session: &str) -> Result<Option<String>> {
        Ok(self.load(session).await?.map(|r| r.credential))
    }

    async fn remember_note(&self, session: &str, message_id: i64, note_id: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.load(session).await?.ok_or_else(|| unbound(session))?;
        record.notes.insert(message_id, note_id);
        self.store(session, &record).await
    }

    async fn note_for_message(&self, session: &str, message_id: i64) -> Result<Option<i64>> {
        Ok(self
            .load(session)
            .await?
            .and_then(|r| r.notes.get(&message_id).copied()))
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store, for tests and embedding.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn bind(&self, session: &str, credential: &str) -> Result<()> {
        let credential = validate(credential)?;
        self.sessions.write().await.insert(
            session.to_string(),
            SessionRecord {
                credential,
                notes: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn unbind(&self, session: &str) -> Result<bool> {
        Ok(self.sessions.write().await.remove(session).is_some())
    }

    async fn credential(&self, session: &str) -> Result<Option<String>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .map(|r| r.credential.clone()))
    }

    async fn remember_note(&self, session: &str, message_id: i64, note_id: i64) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session).ok_or_else(|| unbound(session))?;
        record.notes.insert(message_id, note_id);
        Ok(())
    }

    async fn note_for_message(&self, session: &str, message_id: i64) -> Result<Option<i64>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .and_then(|r| r.notes.get(&message_id).copied()))
    }
}
