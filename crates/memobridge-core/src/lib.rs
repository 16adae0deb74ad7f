//! # memobridge-core
//!
//! Core types, traits, and abstractions for the memobridge chat-to-note relay.
//!
//! This crate provides:
//! - The note, tag and resource data model shared by every other crate
//! - The remote API traits the client implements and the batch engine consumes
//! - The annotated-text parser that turns chat messages into note fields
//! - The concurrent fan-out helper and its aggregate [`BatchResult`]

pub mod batch;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod parse;
pub mod traits;

// Re-export commonly used types at crate root
pub use batch::{join_batch, BatchResult, BatchSummary};
pub use error::{Error, Result};
pub use models::*;
pub use parse::{markup_to_text, parse_annotated, parse_plain};
pub use traits::*;
