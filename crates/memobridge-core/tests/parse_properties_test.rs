//! Behavioural tests for message parsing.
//!
//! Covers:
//! - Directive extraction from annotated messages
//! - Determinism of repeated parses
//! - Markup fallback when the transport supplies no ranges
//! - The plain-text tokenizer

use memobridge_core::{
    parse_annotated, parse_plain, AnnotationRange, Error, ParsedNote, RowStatus, Visibility,
};

const TEXT: &str = "Ship it #PUBLIC #ARCHIVED #project #RES42";

fn ranges() -> Vec<AnnotationRange> {
    vec![
        AnnotationRange::hashtag(8, 7),
        AnnotationRange::hashtag(16, 9),
        AnnotationRange::hashtag(26, 8),
        AnnotationRange::hashtag(35, 6),
    ]
}

#[test]
fn test_annotated_directives_round_trip() {
    let note = parse_annotated(TEXT, TEXT, Some(&ranges())).expect("valid ranges");

    assert_eq!(note.visibility, Visibility::Public);
    assert_eq!(note.status, RowStatus::Archived);
    assert_eq!(note.tags.len(), 1);
    assert!(note.tags.contains("project"));
    assert_eq!(note.resource_ids, vec![42]);
    assert_eq!(note.body, "Ship it #project");
}

#[test]
fn test_parse_is_deterministic() {
    let markup = "<b>Ship</b> it #PUBLIC #ARCHIVED #project #RES42";
    let first = parse_annotated(TEXT, markup, Some(&ranges())).unwrap();
    let second = parse_annotated(TEXT, markup, Some(&ranges())).unwrap();
    assert_eq!(first, second);

    assert_eq!(parse_plain(TEXT), parse_plain(TEXT));
}

#[test]
fn test_empty_annotations_use_markup_only() {
    let markup = "<i>Ship</i> it #PUBLIC #ARCHIVED #project #RES42";

    let with_empty = parse_annotated(TEXT, markup, Some(&[])).unwrap();
    let with_none = parse_annotated(TEXT, markup, None).unwrap();

    let expected = ParsedNote {
        body: "_Ship_ it #PUBLIC #ARCHIVED #project #RES42".to_string(),
        ..Default::default()
    };
    assert_eq!(with_empty, expected);
    assert_eq!(with_none, expected);
}

#[test]
fn test_plain_tokenizer() {
    let note = parse_plain("hello #work &7 world PUBLIC");
    assert_eq!(note.body, "hello #work world");
    assert_eq!(note.tags.into_iter().collect::<Vec<_>>(), vec!["work"]);
    assert_eq!(note.resource_ids, vec![7]);
    assert_eq!(note.visibility, Visibility::Public);
}

#[test]
fn test_malformed_offsets_surface_an_error() {
    let bad = vec![AnnotationRange::hashtag(30, 40)];
    match parse_annotated(TEXT, TEXT, Some(&bad)) {
        Err(Error::ParseInconsistency(msg)) => assert!(msg.contains("exceeds")),
        other => panic!("expected ParseInconsistency, got {:?}", other),
    }
}

#[test]
fn test_duplicate_tags_collapse() {
    let text = "#a #b #a";
    let ranges = vec![
        AnnotationRange::hashtag(0, 2),
        AnnotationRange::hashtag(3, 2),
        AnnotationRange::hashtag(6, 2),
    ];
    let note = parse_annotated(text, text, Some(&ranges)).unwrap();
    assert_eq!(note.tags.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(note.body, "#a #b #a");
}
