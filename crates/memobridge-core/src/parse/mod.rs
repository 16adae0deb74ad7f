//! Chat message parsing.
//!
//! Two strategies turn a message into [`ParsedNote`](crate::ParsedNote)
//! fields:
//!
//! - [`parse_annotated`] uses the transport's formatting ranges over the
//!   plain text to find directives, edits the markup rendering and converts
//!   it to the canonical body. Without ranges it falls back to converting
//!   the markup alone.
//! - [`parse_plain`] tokenizes plain text on single spaces, for callers
//!   that have neither markup nor ranges.
//!
//! Both are pure: the same input always yields the same note.

mod annotated;
mod markup;
mod plain;

pub use annotated::parse_annotated;
pub use markup::markup_to_text;
pub use plain::parse_plain;

/// Tag name of a `#tag` token, with surrounding `#` characters removed.
pub(crate) fn hashtag_name(token: &str) -> Option<&str> {
    if !token.starts_with('#') {
        return None;
    }
    let name = token.trim_matches('#');
    (!name.is_empty()).then_some(name)
}

/// Parse a non-empty run of ASCII digits.
pub(crate) fn digit_run(s: &str) -> Option<&str> {
    (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())).then_some(s)
}
