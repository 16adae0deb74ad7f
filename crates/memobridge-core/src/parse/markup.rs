//! HTML-flavoured chat markup to Markdown-flavoured note body.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static EMPTY_INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<(?:b|strong|i|em|u|ins|s|strike|del|code|span|tg-spoiler)\b[^>]*>\s*</(?:b|strong|i|em|u|ins|s|strike|del|code|span|tg-spoiler)>",
    )
    .expect("valid empty inline pattern")
});
static PRE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<pre[^>]*>\s*<code(?:\s+class\s*=\s*["']language-([^"']*)["'])?[^>]*>(.*?)</code>\s*</pre>"#)
        .expect("valid pre/code pattern")
});
static PRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<pre\b[^>]*>(.*?)</pre>").expect("valid pre pattern"));
static CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<code\b[^>]*>(.*?)</code>").expect("valid code pattern"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<blockquote\b[^>]*>(.*?)</blockquote>").expect("valid blockquote pattern")
});
static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a\b[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#)
        .expect("valid link pattern")
});
static BOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:b|strong)\b[^>]*>(.*?)</(?:b|strong)>").expect("valid bold pattern")
});
static ITALIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:i|em)\b[^>]*>(.*?)</(?:i|em)>").expect("valid italic pattern")
});
static STRIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:s|strike|del)\b[^>]*>(.*?)</(?:s|strike|del)>")
        .expect("valid strike pattern")
});
static BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"<br\s*/?>").expect("valid br pattern"));
static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][a-zA-Z0-9-]*\b[^>]*>").expect("valid tag pattern"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid entity pattern")
});

/// Convert chat markup to the canonical note body.
///
/// | Markup | Body |
/// |--------|------|
/// | `<b>`, `<strong>` | `**x**` |
/// | `<i>`, `<em>` | `_x_` |
/// | `<s>`, `<strike>`, `<del>` | `~~x~~` |
/// | `<code>` | `` `x` `` |
/// | `<pre>` / `<pre><code class="language-L">` | fenced block |
/// | `<a href="u">t</a>` | `[t](u)` |
/// | `<blockquote>` | `> ` prefixed lines |
/// | `<br>` | newline |
///
/// Other tags (underline, spoilers, custom emoji) are dropped keeping their
/// text, then HTML entities are decoded and the result is trimmed.
///
/// ```
/// use memobridge_core::markup_to_text;
///
/// assert_eq!(markup_to_text("<b>bold</b> &amp; <i>it</i>"), "**bold** & _it_");
/// ```
pub fn markup_to_text(markup: &str) -> String {
    let markup = strip_empty_inline(markup);
    let text = PRE_CODE.replace_all(&markup, |caps: &Captures| {
        let lang = caps.get(1).map_or("", |m| m.as_str());
        fence(lang, &caps[2])
    });
    let text = PRE.replace_all(&text, |caps: &Captures| fence("", &caps[1]));
    let text = CODE.replace_all(&text, "`${1}`");
    let text = BLOCKQUOTE.replace_all(&text, |caps: &Captures| {
        caps[1]
            .trim_matches('\n')
            .lines()
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    });
    let text = LINK.replace_all(&text, "[${2}](${1})");
    let text = BOLD.replace_all(&text, "**${1}**");
    let text = ITALIC.replace_all(&text, "_${1}_");
    let text = STRIKE.replace_all(&text, "~~${1}~~");
    let text = BREAK.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    text.trim().to_string()
}

/// Drop formatting spans left with no content, innermost first.
fn strip_empty_inline(markup: &str) -> String {
    let mut text = markup.to_string();
    while EMPTY_INLINE.is_match(&text) {
        text = EMPTY_INLINE.replace_all(&text, "").into_owned();
    }
    text
}

fn fence(lang: &str, content: &str) -> String {
    format!("```{}\n{}\n```", lang, content.trim_matches('\n'))
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(markup_to_text("hello #tag world"), "hello #tag world");
    }

    #[test]
    fn inline_formatting() {
        assert_eq!(
            markup_to_text("<b>a</b> <strong>b</strong> <i>c</i> <em>d</em> <s>e</s> <del>f</del>"),
            "**a** **b** _c_ _d_ ~~e~~ ~~f~~"
        );
    }

    #[test]
    fn nested_formatting() {
        assert_eq!(markup_to_text("<b><i>both</i></b>"), "**_both_**");
    }

    #[test]
    fn empty_spans_are_dropped() {
        assert_eq!(markup_to_text("<b></b> <s> </s>x"), "x");
        assert_eq!(markup_to_text("<b><i></i></b> x <code></code>"), "x");
        assert_eq!(markup_to_text("a<br>b"), "a\nb");
    }

    #[test]
    fn underline_and_spoiler_keep_text() {
        assert_eq!(
            markup_to_text(r#"<u>under</u> <tg-spoiler>secret</tg-spoiler> <span class="tg-spoiler">x</span>"#),
            "under secret x"
        );
    }

    #[test]
    fn links() {
        assert_eq!(
            markup_to_text(r#"see <a href="https://example.com/?a=1&amp;b=2">docs</a>"#),
            "see [docs](https://example.com/?a=1&b=2)"
        );
    }

    #[test]
    fn inline_code_keeps_escaped_markup() {
        assert_eq!(markup_to_text("<code>&lt;b&gt;</code>"), "`<b>`");
    }

    #[test]
    fn pre_blocks_become_fences() {
        assert_eq!(markup_to_text("<pre>x = 1</pre>"), "```\nx = 1\n```");
        assert_eq!(
            markup_to_text(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#),
            "```rust\nfn main() {}\n```"
        );
    }

    #[test]
    fn blockquote_prefixes_lines() {
        assert_eq!(
            markup_to_text("<blockquote>one\ntwo</blockquote>\nafter"),
            "> one\n> two\nafter"
        );
    }

    #[test]
    fn line_breaks() {
        assert_eq!(markup_to_text("a<br>b<br/>c"), "a\nb\nc");
    }

    #[test]
    fn entities() {
        assert_eq!(
            markup_to_text("&lt;&gt;&amp;&quot;&#39;&#x41;&unknown;"),
            "<>&\"'A&unknown;"
        );
    }

    #[test]
    fn literal_ampersand_entity_is_not_double_decoded() {
        assert_eq!(markup_to_text("&amp;lt;"), "&lt;");
    }

    #[test]
    fn result_is_trimmed() {
        assert_eq!(markup_to_text("  \n<b>x</b>  \n"), "**x**");
    }

    #[test]
    fn blockquote_does_not_match_bold() {
        assert_eq!(markup_to_text("<blockquote><b>q</b></blockquote>"), "> **q**");
    }
}
