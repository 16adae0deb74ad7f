use tracing::trace;

use super::{digit_run, hashtag_name};
use crate::models::{ParsedNote, RowStatus, Visibility};

/// Parse plain text by splitting on single spaces.
///
/// - A token that is exactly `PRIVATE`, `PROTECTED` or `PUBLIC` sets the
///   visibility, and `NORMAL` or `ARCHIVED` sets the status. Both are
///   dropped from the body; the last one wins.
/// - A `#tag` token records a tag and stays in the body.
/// - An `&<digits>` token records a resource id and is dropped from the body.
/// - Everything else stays in the body. Empty tokens from repeated spaces
///   are kept, so the body spacing is preserved.
///
/// ```
/// use memobridge_core::{parse_plain, Visibility};
///
/// let note = parse_plain("hello #work &7 world PUBLIC");
/// assert_eq!(note.body, "hello #work world");
/// assert_eq!(note.resource_ids, vec![7]);
/// assert_eq!(note.visibility, Visibility::Public);
/// ```
pub fn parse_plain(text: &str) -> ParsedNote {
    let mut parsed = ParsedNote::default();
    let mut words: Vec<&str> = Vec::new();

    for token in text.split(' ') {
        if let Some(visibility) = Visibility::from_directive(token) {
            parsed.visibility = visibility;
        } else if let Some(status) = RowStatus::from_directive(token) {
            parsed.status = status;
        } else if token.starts_with('#') {
            if let Some(name) = hashtag_name(token) {
                trace!(tag = name, "Plain tag");
                parsed.tags.insert(name.to_string());
            }
            words.push(token);
        } else if let Some(id) = token
            .strip_prefix('&')
            .and_then(digit_run)
            .and_then(|digits| digits.parse::<i64>().ok())
        {
            parsed.resource_ids.push(id);
        } else {
            words.push(token);
        }
    }

    parsed.body = words.join(" ");
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_tags_and_resources() {
        let note = parse_plain("hello #work &7 world PUBLIC");
        assert_eq!(note.body, "hello #work world");
        assert_eq!(note.tags.iter().collect::<Vec<_>>(), vec!["work"]);
        assert_eq!(note.resource_ids, vec![7]);
        assert_eq!(note.visibility, Visibility::Public);
        assert_eq!(note.status, RowStatus::Normal);
    }

    #[test]
    fn defaults_without_directives() {
        let note = parse_plain("just words");
        assert_eq!(note.body, "just words");
        assert!(note.tags.is_empty());
        assert!(note.resource_ids.is_empty());
        assert_eq!(note.visibility, Visibility::Private);
        assert_eq!(note.status, RowStatus::Normal);
    }

    #[test]
    fn later_directive_wins() {
        let note = parse_plain("PUBLIC a PROTECTED ARCHIVED b NORMAL");
        assert_eq!(note.visibility, Visibility::Protected);
        assert_eq!(note.status, RowStatus::Normal);
        assert_eq!(note.body, "a b");
    }

    #[test]
    fn hashed_directive_is_a_tag_in_plain_mode() {
        let note = parse_plain("#PUBLIC note");
        assert_eq!(note.visibility, Visibility::Private);
        assert!(note.tags.contains("PUBLIC"));
        assert_eq!(note.body, "#PUBLIC note");
    }

    #[test]
    fn lowercase_directive_is_plain_text() {
        let note = parse_plain("make it public");
        assert_eq!(note.visibility, Visibility::Private);
        assert_eq!(note.body, "make it public");
    }

    #[test]
    fn non_numeric_ampersand_token_stays() {
        let note = parse_plain("salt & pepper &x1 &12");
        assert_eq!(note.body, "salt & pepper &x1");
        assert_eq!(note.resource_ids, vec![12]);
    }

    #[test]
    fn overflowing_resource_id_stays_in_body() {
        let note = parse_plain("&99999999999999999999999");
        assert!(note.resource_ids.is_empty());
        assert_eq!(note.body, "&99999999999999999999999");
    }

    #[test]
    fn duplicate_resources_and_tags() {
        let note = parse_plain("#a &1 #a &1");
        assert_eq!(note.tags.len(), 1);
        assert_eq!(note.resource_ids, vec![1, 1]);
    }

    #[test]
    fn spacing_is_preserved() {
        let note = parse_plain("a  b PUBLIC");
        assert_eq!(note.body, "a  b");
    }

    #[test]
    fn bare_hash_is_not_a_tag() {
        let note = parse_plain("# heading");
        assert!(note.tags.is_empty());
        assert_eq!(note.body, "# heading");
    }
}
