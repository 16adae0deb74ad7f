//! Selection policy evaluation.
//!
//! A policy names an ordered sequence of tags and how their per-tag note
//! sets combine. Evaluation is synchronous and runs after every candidate
//! query has returned, so the provisional and confirmed sets are never
//! touched by concurrent work.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use memobridge_core::Error;
use serde::{Deserialize, Serialize};

/// How per-tag note sets combine into the target set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    #[default]
    Union,
    Intersect,
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combine::Union => write!(f, "union"),
            Combine::Intersect => write!(f, "intersect"),
        }
    }
}

impl FromStr for Combine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "union" | "or" => Ok(Combine::Union),
            "intersect" | "and" => Ok(Combine::Intersect),
            other => Err(Error::InvalidInput(format!(
                "unknown combine mode: {} (expected union or intersect)",
                other
            ))),
        }
    }
}

/// Which notes a batch mutation targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    pub tag_keys: Vec<String>,
    pub combine: Combine,
}

impl SelectionPolicy {
    pub fn new<I, S>(tags: I, combine: Combine) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag_keys: tags
                .into_iter()
                .map(|t| t.into().trim_start_matches('#').to_string())
                .collect(),
            combine,
        }
    }

    /// Every note carrying `tag`.
    pub fn single(tag: impl Into<String>) -> Self {
        Self::new([tag.into()], Combine::Union)
    }

    pub fn union<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(tags, Combine::Union)
    }

    pub fn intersect<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(tags, Combine::Intersect)
    }

    pub fn is_empty(&self) -> bool {
        self.tag_keys.is_empty()
    }
}

/// Combine per-tag id lists, given in tag-sequence order, into the ordered
/// target id list.
///
/// - Union keeps every id in first-seen order.
/// - Intersect keeps an id once it has been seen under a second tag; an id
///   seen under only one tag stays provisional and is dropped.
/// - A single list is taken whole under either mode.
/// - No lists yield no targets.
pub fn combine_targets(combine: Combine, per_tag: &[Vec<i64>]) -> Vec<i64> {
    let mut confirmed = Vec::new();
    let mut emitted = HashSet::new();

    if per_tag.len() == 1 || combine == Combine::Union {
        for id in per_tag.iter().flatten() {
            if emitted.insert(*id) {
                confirmed.push(*id);
            }
        }
        return confirmed;
    }

    let mut provisional = HashSet::new();
    for ids in per_tag {
        // Repeats within one tag's result must not count as a second tag.
        let mut seen_here = HashSet::new();
        for id in ids {
            if !seen_here.insert(*id) {
                continue;
            }
            if !provisional.insert(*id) && emitted.insert(*id) {
                confirmed.push(*id);
            }
        }
    }
    confirmed
}
