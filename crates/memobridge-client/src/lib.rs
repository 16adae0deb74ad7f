//! # memobridge-client
//!
//! HTTP client for the remote note service.
//!
//! This crate provides:
//! - [`Credential`] parsing and validation of the per-session API URL
//! - [`MemosClient`], implementing the core note, tag and resource traits
//! - [`ClientConfig`] with environment overrides
//! - An in-memory [`mock::MockMemosService`] (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use memobridge_client::{ClientConfig, MemosClient};
//! use memobridge_core::{CreateNoteRequest, NoteApi, Visibility};
//!
//! #[tokio::main]
//! async fn main() -> memobridge_core::Result<()> {
//!     let client = MemosClient::new(
//!         "https://memos.example.com/api/note?openId=secret",
//!         ClientConfig::from_env(),
//!     )?;
//!     let id = client
//!         .create_note(&CreateNoteRequest {
//!             content: "hello #inbox".into(),
//!             visibility: Visibility::Private,
//!             resource_ids: vec![],
//!         })
//!         .await?;
//!     println!("{}", client.credential().note_link(id));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::MemosClient;
pub use config::ClientConfig;
pub use credential::Credential;
