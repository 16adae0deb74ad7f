//! # memobridge-batch
//!
//! Batch maintenance over the remote note service.
//!
//! This crate provides:
//! - [`SelectionPolicy`] evaluation (union or intersection over tag filters)
//! - Token-exact tag rewriting of note bodies
//! - [`BatchTools`] with tag rename and bulk visibility change, both fanning
//!   out one update per target note and collecting per-note failures
//!
//! ## Example
//!
//! ```ignore
//! use memobridge_batch::{BatchConfig, BatchTools, SelectionPolicy};
//! use memobridge_core::Visibility;
//!
//! let tools = BatchTools::new(client, BatchConfig::from_env());
//! let result = tools
//!     .bulk_set_visibility(&SelectionPolicy::intersect(["work", "2024"]), Visibility::Public)
//!     .await?;
//! println!("{:?}", result.summary());
//! ```

pub mod config;
pub mod rewrite;
pub mod selection;
pub mod tools;

pub use config::BatchConfig;
pub use rewrite::rewrite_tag_tokens;
pub use selection::{combine_targets, Combine, SelectionPolicy};
pub use tools::{BatchTools, RenameReport, RenameSummary, TagStep};
