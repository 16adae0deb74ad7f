//! Token-exact tag rewriting.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// A maximal run of non-whitespace characters.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("valid token regex"));

/// Replace every whitespace-delimited token equal to `#old` with `#new`.
///
/// Tokens that merely contain `#old` (`#older`, `x#old`, `#old,`) are left
/// untouched and whitespace between tokens is preserved byte for byte.
/// Returns `None` when nothing changed.
///
/// ```
/// use memobridge_batch::rewrite_tag_tokens;
///
/// assert_eq!(
///     rewrite_tag_tokens("#tagging #tag done", "tag", "newtag").as_deref(),
///     Some("#tagging #newtag done"),
/// );
/// assert_eq!(rewrite_tag_tokens("#tagging only", "tag", "newtag"), None);
/// ```
pub fn rewrite_tag_tokens(body: &str, old: &str, new: &str) -> Option<String> {
    let needle = format!("#{}", old);
    let replacement = format!("#{}", new);

    match TOKEN.replace_all(body, |caps: &regex::Captures<'_>| {
        if caps[0] == needle {
            replacement.clone()
        } else {
            caps[0].to_string()
        }
    }) {
        Cow::Owned(rewritten) if rewritten != body => Some(rewritten),
        _ => None,
    }
}
