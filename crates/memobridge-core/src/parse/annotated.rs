use tracing::{debug, trace};

use super::{digit_run, markup::markup_to_text};
use crate::error::{Error, Result};
use crate::models::{AnnotationKind, AnnotationRange, ParsedNote, RowStatus, Visibility};

/// Prefix of a resource-reference hashtag (`#RES42`).
const RESOURCE_PREFIX: &str = "#RES";

/// Parse a message from its plain text, its markup rendering and the
/// transport's annotation ranges over the plain text.
///
/// Ranges are visited in the order given. For each hashtag range the
/// annotated text is classified:
///
/// 1. `#PRIVATE`, `#PROTECTED`, `#PUBLIC` set the visibility,
/// 2. `#NORMAL`, `#ARCHIVED` set the status,
/// 3. `#RES<digits>` appends a resource id,
/// 4. anything else is a tag.
///
/// Directives (1-3) are removed from the markup; tags stay visible. A
/// later directive of the same kind overrides an earlier one. Ranges of
/// any other kind are ignored. The edited markup is then converted to the
/// canonical body.
///
/// With no ranges at all the markup is authoritative: it is converted as-is
/// and the note gets default fields, even if the text looks like it
/// contains hashtags.
///
/// # Errors
///
/// Returns [`Error::ParseInconsistency`] when a range is empty, runs past
/// the end of `text`, splits a UTF-16 surrogate pair, or references a
/// resource id that does not fit in an `i64`.
pub fn parse_annotated(
    text: &str,
    markup: &str,
    annotations: Option<&[AnnotationRange]>,
) -> Result<ParsedNote> {
    let ranges = match annotations {
        Some(ranges) if !ranges.is_empty() => ranges,
        _ => {
            debug!(subsystem = "parse", "No annotations, converting markup only");
            return Ok(ParsedNote {
                body: markup_to_text(markup),
                ..Default::default()
            });
        }
    };

    let units: Vec<u16> = text.encode_utf16().collect();
    let mut parsed = ParsedNote::default();
    let mut markup = markup.to_string();

    for range in ranges {
        let annotated = slice_utf16(&units, range)?;
        if range.kind != AnnotationKind::Hashtag {
            trace!(offset = range.offset, "Ignoring non-hashtag annotation");
            continue;
        }

        let name = annotated.strip_prefix('#').unwrap_or(annotated.as_str());
        if let Some(visibility) = Visibility::from_directive(name) {
            parsed.visibility = visibility;
        } else if let Some(status) = RowStatus::from_directive(name) {
            parsed.status = status;
        } else if let Some(digits) = annotated.strip_prefix(RESOURCE_PREFIX).and_then(digit_run) {
            let id = digits.parse::<i64>().map_err(|_| {
                Error::ParseInconsistency(format!("resource id out of range: {}", annotated))
            })?;
            parsed.resource_ids.push(id);
        } else {
            if !name.is_empty() {
                parsed.tags.insert(name.to_string());
            }
            continue;
        }

        trace!(directive = %annotated, "Removing directive from markup");
        markup = remove_directive(&markup, &annotated);
    }

    parsed.body = markup_to_text(&markup);
    debug!(
        subsystem = "parse",
        visibility = %parsed.visibility,
        status = %parsed.status,
        tag_count = parsed.tags.len(),
        resource_count = parsed.resource_ids.len(),
        "Parsed annotated message"
    );
    Ok(parsed)
}

fn slice_utf16(units: &[u16], range: &AnnotationRange) -> Result<String> {
    if range.length == 0 {
        return Err(Error::ParseInconsistency(format!(
            "empty annotation at offset {}",
            range.offset
        )));
    }
    let end = range
        .offset
        .checked_add(range.length)
        .filter(|end| *end <= units.len())
        .ok_or_else(|| {
            Error::ParseInconsistency(format!(
                "annotation {}+{} exceeds text length {}",
                range.offset,
                range.length,
                units.len()
            ))
        })?;
    String::from_utf16(&units[range.offset..end]).map_err(|_| {
        Error::ParseInconsistency(format!(
            "annotation {}+{} splits a character",
            range.offset, range.length
        ))
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Remove every occurrence of `directive` that is not followed by a word
/// character, together with one adjacent space.
fn remove_directive(markup: &str, directive: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;

    for (start, _) in markup.match_indices(directive) {
        if start < cursor {
            continue;
        }
        let end = start + directive.len();
        if markup[end..].chars().next().is_some_and(is_word_char) {
            continue;
        }

        let mut cut_start = start;
        let mut cut_end = end;
        if markup[end..].starts_with(' ') {
            cut_end += 1;
        } else if start > cursor && markup[..start].ends_with(' ') {
            cut_start -= 1;
        }
        out.push_str(&markup[cursor..cut_start]);
        cursor = cut_end;
    }

    out.push_str(&markup[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hashtag ranges for every `#word` in an ASCII text.
    fn hashtags(text: &str) -> Vec<AnnotationRange> {
        let mut ranges = Vec::new();
        let mut offset = 0;
        for word in text.split(' ') {
            if word.starts_with('#') {
                ranges.push(AnnotationRange::hashtag(offset, word.len()));
            }
            offset += word.len() + 1;
        }
        ranges
    }

    fn parse(text: &str) -> ParsedNote {
        parse_annotated(text, text, Some(&hashtags(text))).unwrap()
    }

    #[test]
    fn directives_are_extracted_and_removed() {
        let note = parse("#PUBLIC #ARCHIVED #project #RES42");
        assert_eq!(note.visibility, Visibility::Public);
        assert_eq!(note.status, RowStatus::Archived);
        assert_eq!(note.tags.iter().collect::<Vec<_>>(), vec!["project"]);
        assert_eq!(note.resource_ids, vec![42]);
        assert_eq!(note.body, "#project");
    }

    #[test]
    fn directive_in_the_middle_collapses_space() {
        let note = parse("buy milk #PROTECTED today");
        assert_eq!(note.body, "buy milk today");
        assert_eq!(note.visibility, Visibility::Protected);
    }

    #[test]
    fn later_scalar_directive_wins() {
        let note = parse("#PUBLIC x #PRIVATE");
        assert_eq!(note.visibility, Visibility::Private);
        assert_eq!(note.body, "x");
    }

    #[test]
    fn source_order_not_offset_order() {
        let text = "#PUBLIC #PROTECTED";
        let mut ranges = hashtags(text);
        ranges.reverse();
        let note = parse_annotated(text, text, Some(&ranges)).unwrap();
        assert_eq!(note.visibility, Visibility::Public);
    }

    #[test]
    fn resources_keep_order_and_duplicates() {
        let note = parse("#RES3 #RES1 #RES3 body");
        assert_eq!(note.resource_ids, vec![3, 1, 3]);
        assert_eq!(note.body, "body");
    }

    #[test]
    fn res_prefix_without_digits_is_a_tag() {
        let note = parse("#RESEARCH notes");
        assert!(note.resource_ids.is_empty());
        assert!(note.tags.contains("RESEARCH"));
        assert_eq!(note.body, "#RESEARCH notes");
    }

    #[test]
    fn removing_short_directive_keeps_longer_token() {
        let text = "#RES4 and #RES42";
        let ranges = vec![AnnotationRange::hashtag(0, 5)];
        let note = parse_annotated(text, text, Some(&ranges)).unwrap();
        assert_eq!(note.resource_ids, vec![4]);
        assert_eq!(note.body, "and #RES42");
    }

    #[test]
    fn non_hashtag_ranges_are_ignored() {
        let text = "PUBLIC #tag";
        let ranges = vec![AnnotationRange::other(0, 6), AnnotationRange::hashtag(7, 4)];
        let note = parse_annotated(text, text, Some(&ranges)).unwrap();
        assert_eq!(note.visibility, Visibility::Private);
        assert_eq!(note.body, "PUBLIC #tag");
    }

    #[test]
    fn markup_is_converted_after_removal() {
        let text = "bold #PUBLIC #idea";
        let markup = "<b>bold</b> #PUBLIC #idea";
        let note = parse_annotated(text, markup, Some(&hashtags(text))).unwrap();
        assert_eq!(note.body, "**bold** #idea");
        assert_eq!(note.visibility, Visibility::Public);
    }

    #[test]
    fn formatted_directive_leaves_no_markup() {
        let text = "#PUBLIC note";
        let ranges = vec![AnnotationRange::hashtag(0, 7)];
        let note = parse_annotated(text, "<b>#PUBLIC</b> note", Some(&ranges)).unwrap();
        assert_eq!(note.body, "note");
        assert_eq!(note.visibility, Visibility::Public);

        let text = "done #ARCHIVED";
        let ranges = vec![AnnotationRange::hashtag(5, 9)];
        let note = parse_annotated(text, "done <i>#ARCHIVED</i>", Some(&ranges)).unwrap();
        assert_eq!(note.body, "done");
    }

    #[test]
    fn offsets_are_utf16_units() {
        // The emoji takes two UTF-16 units.
        let text = "😀 #PUBLIC #café";
        let ranges = vec![AnnotationRange::hashtag(3, 7), AnnotationRange::hashtag(11, 5)];
        let note = parse_annotated(text, text, Some(&ranges)).unwrap();
        assert_eq!(note.visibility, Visibility::Public);
        assert!(note.tags.contains("café"));
        assert_eq!(note.body, "😀 #café");
    }

    #[test]
    fn range_past_end_is_rejected() {
        let ranges = vec![AnnotationRange::hashtag(2, 10)];
        let err = parse_annotated("#tag", "#tag", Some(&ranges)).unwrap_err();
        assert!(matches!(err, Error::ParseInconsistency(_)));
    }

    #[test]
    fn empty_range_is_rejected() {
        let ranges = vec![AnnotationRange::hashtag(0, 0)];
        let err = parse_annotated("#tag", "#tag", Some(&ranges)).unwrap_err();
        assert!(matches!(err, Error::ParseInconsistency(_)));
    }

    #[test]
    fn split_surrogate_is_rejected() {
        let ranges = vec![AnnotationRange::hashtag(1, 2)];
        let err = parse_annotated("😀x", "😀x", Some(&ranges)).unwrap_err();
        assert!(matches!(err, Error::ParseInconsistency(_)));
    }

    #[test]
    fn overflowing_resource_id_is_rejected() {
        let text = "#RES99999999999999999999";
        let err = parse_annotated(text, text, Some(&hashtags(text))).unwrap_err();
        assert!(matches!(err, Error::ParseInconsistency(_)));
    }

    #[test]
    fn missing_annotations_fall_back_to_markup() {
        let note = parse_annotated("#PUBLIC #tag", "<i>#PUBLIC</i> #tag", None).unwrap();
        assert_eq!(note, ParsedNote {
            body: "_#PUBLIC_ #tag".to_string(),
            ..Default::default()
        });
    }

    #[test]
    fn remove_directive_edges() {
        assert_eq!(remove_directive("#A", "#A"), "");
        assert_eq!(remove_directive("x #A", "#A"), "x");
        assert_eq!(remove_directive("#A x", "#A"), "x");
        assert_eq!(remove_directive("#A #A", "#A"), "");
        assert_eq!(remove_directive("#AB #A.", "#A"), "#AB.");
        assert_eq!(remove_directive("x #A\ny", "#A"), "x\ny");
    }
}
