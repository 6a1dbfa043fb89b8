//! The individual text passes behind [`super::render`]. Each one is a global
//! substitution over the output of the previous pass.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    Normalize,
    Escape,
    Code,
    Headings,
    Emphasis,
    Lists,
    Quotes,
    Tables,
    Links,
}

pub struct Pass {
    pub name: &'static str,
    pub concern: Concern,
    pub apply: fn(&str) -> String,
}

/// Passes in the order they run. Reordering changes the output.
pub const PASSES: &[Pass] = &[
    Pass { name: "normalize", concern: Concern::Normalize, apply: normalize },
    Pass { name: "escape", concern: Concern::Escape, apply: escape_html },
    Pass { name: "fenced_code", concern: Concern::Code, apply: fenced_code },
    Pass { name: "inline_code", concern: Concern::Code, apply: inline_code },
    Pass { name: "headings", concern: Concern::Headings, apply: headings },
    Pass { name: "bold", concern: Concern::Emphasis, apply: bold },
    Pass { name: "italic", concern: Concern::Emphasis, apply: italic },
    Pass { name: "list_label", concern: Concern::Lists, apply: list_label },
    Pass { name: "ordered_list", concern: Concern::Lists, apply: ordered_list },
    Pass { name: "unordered_list", concern: Concern::Lists, apply: unordered_list },
    Pass { name: "blockquote", concern: Concern::Quotes, apply: blockquote },
    Pass { name: "table_scroll", concern: Concern::Tables, apply: table_scroll },
    Pass { name: "autolink", concern: Concern::Links, apply: autolink },
];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid markdown pattern {pattern:?}: {e}"))
}

lazy_static! {
    static ref CR: Regex = re(r"\r\n?");
    static ref TRAILING_WS: Regex = re(r"[\t ]+\n");
    static ref BLANK_RUN: Regex = re(r"\n{3,}");
    static ref FENCE: Regex = re(r"(?s)```(.*?)```");
    static ref INLINE_CODE: Regex = re(r"`([^`]+)`");
    static ref H4: Regex = re(r"(?m)^####\s*(.*)$");
    static ref H3: Regex = re(r"(?m)^###\s*(.*)$");
    static ref H2: Regex = re(r"(?m)^##\s*(.*)$");
    static ref H1: Regex = re(r"(?m)^#\s*(.*)$");
    static ref BOLD: Regex = re(r"\*\*([^*]+)\*\*");
    static ref ITALIC: Regex = re(r"\*([^*]+)\*");
    // The whitespace run after the colon is consumed up to the newline that
    // starts the bullet line; only that newline and the bullet are kept.
    static ref LIST_LABEL: Regex = re(r"(?m)^\s*1\.\s+(.+?:)\s*(\n\s*[-•–—])");
    static ref OL_ITEM: Regex = re(r"(?m)^\s*[0-9]+\. (.*)$");
    static ref OL_GROUP: Regex = re(r"(<ol-item>.*</ol-item>(?:\n{1,2})?)+");
    static ref UL_ITEM: Regex = re(r"(?m)^\s*[-•–—] (.*)$");
    static ref UL_GROUP: Regex = re(r"(<ul-item>.*</ul-item>(?:\n{1,2})?)+");
    static ref QUOTE: Regex = re(r"(?m)^&gt; (.*)$");
    static ref TABLE: Regex = re(r"(?s)<table.*?</table>");
    static ref URL: Regex = re(r"(https?://[^\s]+)");
}

/// Unify line endings, strip trailing blanks and collapse runs of blank lines.
pub fn normalize(text: &str) -> String {
    let text = CR.replace_all(text, "\n");
    let text = TRAILING_WS.replace_all(&text, "\n");
    BLANK_RUN.replace_all(&text, "\n\n").into_owned()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn fenced_code(text: &str) -> String {
    FENCE
        .replace_all(
            text,
            r#"<pre class="rounded bg-background/40 p-3 overflow-x-auto"><code>${1}</code></pre>"#,
        )
        .into_owned()
}

pub fn inline_code(text: &str) -> String {
    INLINE_CODE
        .replace_all(
            text,
            r#"<code class="rounded bg-background/40 px-1 py-0.5">${1}</code>"#,
        )
        .into_owned()
}

/// `#` through `####`, longest marker first.
pub fn headings(text: &str) -> String {
    let text = H4.replace_all(text, "<h4>${1}</h4>");
    let text = H3.replace_all(&text, "<h3>${1}</h3>");
    let text = H2.replace_all(&text, "<h2>${1}</h2>");
    H1.replace_all(&text, "<h1>${1}</h1>").into_owned()
}

pub fn bold(text: &str) -> String {
    BOLD.replace_all(text, "<strong>${1}</strong>").into_owned()
}

pub fn italic(text: &str) -> String {
    ITALIC.replace_all(text, "<em>${1}</em>").into_owned()
}

/// A lone `1. Label:` line heading a bullet block becomes a bold paragraph
/// instead of a one-item ordered list.
pub fn list_label(text: &str) -> String {
    LIST_LABEL
        .replace_all(text, "<p><strong>${1}</strong></p>${2}")
        .into_owned()
}

pub fn ordered_list(text: &str) -> String {
    let tagged = OL_ITEM.replace_all(text, "<ol-item>${1}</ol-item>");
    OL_GROUP
        .replace_all(&tagged, |caps: &Captures| {
            format!(
                r#"<ol class="ml-5 pl-1 list-decimal space-y-1">{}</ol>"#,
                caps[0]
                    .replace("<ol-item>", "<li>")
                    .replace("</ol-item>", "</li>")
            )
        })
        .into_owned()
}

/// Bullets may be `-`, `•`, an en dash or an em dash.
pub fn unordered_list(text: &str) -> String {
    let tagged = UL_ITEM.replace_all(text, "<ul-item>${1}</ul-item>");
    UL_GROUP
        .replace_all(&tagged, |caps: &Captures| {
            format!(
                r#"<ul class="ml-5 list-disc space-y-1">{}</ul>"#,
                caps[0]
                    .replace("<ul-item>", "<li>")
                    .replace("</ul-item>", "</li>")
            )
        })
        .into_owned()
}

/// Runs after escaping, so the quote marker arrives as `&gt; `.
pub fn blockquote(text: &str) -> String {
    QUOTE
        .replace_all(
            text,
            r#"<blockquote class="border-l pl-3 rounded-sm italic text-muted-foreground/80 bg-background/30 py-1">${1}</blockquote>"#,
        )
        .into_owned()
}

pub fn table_scroll(text: &str) -> String {
    TABLE
        .replace_all(text, r#"<div class="table-scroll">${0}</div>"#)
        .into_owned()
}

pub fn autolink(text: &str) -> String {
    URL.replace_all(
        text,
        r#"<a class="underline" href="${1}" target="_blank" rel="noreferrer noopener">${1}</a>"#,
    )
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(normalize("a  \t\nb"), "a\nb");
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_escape_html_ampersand_first() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_fenced_code_spans_lines() {
        let out = fenced_code("before\n```\nlet x = 1;\n```\nafter");
        assert!(out.contains("<pre class=\"rounded bg-background/40 p-3 overflow-x-auto\"><code>\nlet x = 1;\n</code></pre>"));
        assert!(out.starts_with("before\n"));
        assert!(out.ends_with("\nafter"));
    }

    #[test]
    fn test_unterminated_fence_left_alone() {
        assert_eq!(fenced_code("```\nopen"), "```\nopen");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            inline_code("run `cargo` now"),
            "run <code class=\"rounded bg-background/40 px-1 py-0.5\">cargo</code> now"
        );
    }

    #[test]
    fn test_headings_levels() {
        assert_eq!(headings("# One"), "<h1>One</h1>");
        assert_eq!(headings("## Two"), "<h2>Two</h2>");
        assert_eq!(headings("### Three"), "<h3>Three</h3>");
        assert_eq!(headings("#### Four"), "<h4>Four</h4>");
        assert_eq!(headings("text # not a heading"), "text # not a heading");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(bold("**big** deal"), "<strong>big</strong> deal");
        assert_eq!(italic("*soft* touch"), "<em>soft</em> touch");
        assert_eq!(italic(&bold("**b** and *i*")), "<strong>b</strong> and <em>i</em>");
    }

    #[test]
    fn test_list_label_before_bullets() {
        let out = list_label("1. Benefits:\n- fast\n- cheap");
        assert_eq!(out, "<p><strong>Benefits:</strong></p>\n- fast\n- cheap");
    }

    #[test]
    fn test_list_label_consumes_blank_line() {
        let out = list_label("1. Benefits:\n\n• fast");
        assert_eq!(out, "<p><strong>Benefits:</strong></p>\n• fast");
    }

    #[test]
    fn test_list_label_needs_bullets() {
        assert_eq!(list_label("1. Step one:\n2. Step two"), "1. Step one:\n2. Step two");
    }

    #[test]
    fn test_ordered_list_groups_adjacent_items() {
        let out = ordered_list("1. a\n2. b\n\nafter");
        assert_eq!(
            out,
            "<ol class=\"ml-5 pl-1 list-decimal space-y-1\"><li>a</li>\n<li>b</li>\n\n</ol>after"
        );
    }

    #[test]
    fn test_ordered_list_needs_ascii_digits() {
        assert_eq!(ordered_list("١. a\n٢. b"), "١. a\n٢. b");
        assert!(ordered_list("10. ten").contains("<li>ten</li>"));
    }

    #[test]
    fn test_unordered_list_bullet_kinds() {
        let out = unordered_list("- a\n• b\n– c\n— d");
        assert_eq!(
            out,
            "<ul class=\"ml-5 list-disc space-y-1\"><li>a</li>\n<li>b</li>\n<li>c</li>\n<li>d</li></ul>"
        );
    }

    #[test]
    fn test_blockquote_on_escaped_marker() {
        let out = blockquote("&gt; Tip: consolidate");
        assert!(out.starts_with("<blockquote"));
        assert!(out.ends_with(">Tip: consolidate</blockquote>"));
    }

    #[test]
    fn test_table_scroll_wraps_tables() {
        assert_eq!(
            table_scroll("<table><tr></tr></table>"),
            "<div class=\"table-scroll\"><table><tr></tr></table></div>"
        );
    }

    #[test]
    fn test_autolink() {
        assert_eq!(
            autolink("see https://splitbet.io/docs now"),
            "see <a class=\"underline\" href=\"https://splitbet.io/docs\" target=\"_blank\" rel=\"noreferrer noopener\">https://splitbet.io/docs</a> now"
        );
        assert_eq!(autolink("ftp://nope"), "ftp://nope");
    }
}
