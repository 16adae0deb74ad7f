//! # memobridge-relay
//!
//! The calling workflow around the parser and the note client.
//!
//! This crate provides:
//! - [`SessionStore`] binding chat sessions to credentials and remembering
//!   which note each chat message produced
//! - [`MediaGroups`] collecting uploaded photo ids until a reply claims them
//! - [`NoteRelay`] turning incoming messages into created or updated notes
//! - The `memobridge` command-line binary

pub mod media_group;
pub mod relay;
pub mod session;

pub use media_group::{GroupKey, MediaGroups};
pub use relay::{Connector, HttpConnector, IncomingMessage, NoteRelay, PublishedNote, ReplyTarget};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
