//! Line-oriented Markdown to HTML conversion.
//!
//! The converter is a fixed sequence of passes over the whole text. Inline
//! and single-line block syntax is rewritten into tags first, then list
//! lines are grouped and finally everything that is not already a block tag
//! is wrapped into paragraphs. Later passes rely on the tags produced by the
//! earlier ones, so the order matters.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::html::escape_attr;

/// How `[text](url)` links are turned into anchors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum LinkMode {
    /// Every link becomes a plain in-site anchor.
    Plain,
    /// Links to `.md` files open in the page modal; everything else opens in
    /// a new tab.
    #[default]
    ModalAware,
}

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6}) (.*)$").expect("valid heading regex"));
static BOLD_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.*?)\*\*\*").expect("valid bold-italic regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.*?)`").expect("valid inline code regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[]+)\]\(([^\)]+)\)").expect("valid link regex"));
static BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^> (.*)$").expect("valid blockquote regex"));
static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^---$").expect("valid rule regex"));

/// Tags that already form a block and must not be wrapped into `<p>`.
const BLOCK_PREFIXES: &[&str] = &["<h", "<ul", "<ol", "<li", "<blockquote", "<hr", "<a"];

/// Convert Markdown into an HTML fragment.
///
/// Never fails: anything the passes do not recognize is kept as text and
/// ends up inside a paragraph.
#[must_use]
pub fn render(markdown: &str, link_mode: LinkMode) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let text = markdown.replace("\r\n", "\n");

    let text = HEADING.replace_all(&text, |caps: &Captures<'_>| {
        let level = caps[1].len();
        format!("<h{level}>{}</h{level}>", &caps[2])
    });
    let text = BOLD_ITALIC.replace_all(&text, "<strong><em>$1</em></strong>");
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC.replace_all(&text, "<em>$1</em>");
    let text = INLINE_CODE.replace_all(&text, "<code>$1</code>");
    let text = render_inline_links(&text, link_mode);
    let text = BLOCKQUOTE.replace_all(&text, "<blockquote>$1</blockquote>");
    let text = RULE.replace_all(&text, "<hr>");

    let text = group_lists(&text);
    let html = wrap_paragraphs(&text);

    html.trim_end().to_owned()
}

/// Rewrite only `[text](url)` links, leaving the rest of the text untouched.
#[must_use]
pub fn render_inline_links(text: &str, link_mode: LinkMode) -> String {
    LINK.replace_all(text, |caps: &Captures<'_>| {
        link_anchor(&caps[1], &caps[2], link_mode)
    })
    .into_owned()
}

/// Whether a link target points at a Markdown document.
///
/// Query and fragment are ignored, so `notes/a.md#part` still counts.
#[must_use]
pub fn is_markdown_target(url: &str) -> bool {
    let path = url.split(['#', '?']).next().unwrap_or_default();
    path.trim().to_ascii_lowercase().ends_with(".md")
}

fn link_anchor(text: &str, url: &str, link_mode: LinkMode) -> String {
    let url = escape_attr(url.trim());
    match link_mode {
        LinkMode::Plain => format!(r#"<a href="{url}" class="markdown-link">{text}</a>"#),
        LinkMode::ModalAware if is_markdown_target(&url) => format!(
            r##"<a href="#" class="markdown-link modal-trigger" data-md="{url}">{text}</a>"##
        ),
        LinkMode::ModalAware => format!(
            r#"<a href="{url}" class="markdown-link external-link" target="_blank" rel="noopener">{text}</a>"#
        ),
    }
}

fn group_lists(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_list = false;

    for line in text.split('\n') {
        if let Some(item) = line.trim().strip_prefix("- ") {
            if !in_list {
                out.push_str("<ul>");
                in_list = true;
            }
            out.push_str("<li>");
            out.push_str(item.trim());
            out.push_str("</li>");
            continue;
        }

        if in_list {
            out.push_str("</ul>\n");
            in_list = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    if in_list {
        out.push_str("</ul>");
    }

    out
}

fn wrap_paragraphs(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    let mut in_paragraph = false;

    for line in text.split('\n') {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if in_paragraph {
                out.push_str("</p>\n");
                in_paragraph = false;
            }
            continue;
        }

        if BLOCK_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix)) {
            if in_paragraph {
                out.push_str("</p>\n");
                in_paragraph = false;
            }
            out.push_str(line);
            out.push('\n');
            continue;
        }

        if in_paragraph {
            out.push_str("<br>");
        } else {
            out.push_str("<p>");
            in_paragraph = true;
        }
        out.push_str(trimmed);
    }

    if in_paragraph {
        out.push_str("</p>");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(markdown: &str) -> String {
        render(markdown, LinkMode::Plain)
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(plain(""), "");
        assert_eq!(plain("  \n\n"), "");
    }

    #[test]
    fn level_one_heading_is_not_wrapped() {
        let html = plain("# Title");
        assert_eq!(html, "<h1>Title</h1>");
        assert_eq!(html.matches("<h1>Title</h1>").count(), 1);
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn headings_use_longest_prefix() {
        let html = plain("### Three\n###### Six\n## Two");
        assert_eq!(html, "<h3>Three</h3>\n<h6>Six</h6>\n<h2>Two</h2>");
    }

    #[test]
    fn seven_hashes_stay_text() {
        assert_eq!(plain("####### nope"), "<p>####### nope</p>");
    }

    #[test]
    fn emphasis_in_paragraph() {
        assert_eq!(
            plain("**bold** and *italic*"),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn triple_asterisks_become_bold_italic() {
        assert_eq!(
            plain("***both***"),
            "<p><strong><em>both</em></strong></p>"
        );
    }

    #[test]
    fn inline_code_span() {
        assert_eq!(plain("run `cargo`"), "<p>run <code>cargo</code></p>");
    }

    #[test]
    fn consecutive_items_form_one_list() {
        let html = plain("- a\n- b");
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert_eq!(html.matches("<li>").count(), 2);
    }

    #[test]
    fn interrupted_list_is_closed_before_text() {
        let html = plain("- a\ntext\n- b");
        assert_eq!(
            html,
            "<ul><li>a</li></ul>\n<p>text</p>\n<ul><li>b</li></ul>"
        );
    }

    #[test]
    fn paragraph_lines_join_with_br() {
        assert_eq!(plain("one\ntwo\n\nthree"), "<p>one<br>two</p>\n<p>three</p>");
    }

    #[test]
    fn blockquote_and_rule_pass_through() {
        let html = plain("> quoted\n---\nafter");
        assert_eq!(
            html,
            "<blockquote>quoted</blockquote>\n<hr>\n<p>after</p>"
        );
    }

    #[test]
    fn crlf_input_matches_lf_input() {
        assert_eq!(plain("# T\r\nbody\r\n"), plain("# T\nbody\n"));
    }

    #[test]
    fn plain_links_are_internal_anchors() {
        assert_eq!(
            plain("see [notes](notes/a.md)"),
            r#"<p>see <a href="notes/a.md" class="markdown-link">notes</a></p>"#
        );
    }

    #[test]
    fn modal_aware_markdown_link_becomes_trigger() {
        let html = render("see [notes](notes/a.md#top)", LinkMode::ModalAware);
        assert!(html.contains(r#"data-md="notes/a.md#top""#));
        assert!(html.contains("modal-trigger"));
        assert!(!html.contains("target="));
    }

    #[test]
    fn modal_aware_external_link_opens_new_tab() {
        let html = render("[site](https://example.com/?q=1&x=2)", LinkMode::ModalAware);
        assert_eq!(
            html,
            r#"<a href="https://example.com/?q=1&amp;x=2" class="markdown-link external-link" target="_blank" rel="noopener">site</a>"#
        );
    }

    #[test]
    fn inline_links_leave_other_syntax_alone() {
        assert_eq!(
            render_inline_links("**x** [a](b)", LinkMode::Plain),
            r#"**x** <a href="b" class="markdown-link">a</a>"#
        );
    }

    #[test]
    fn markdown_target_detection_ignores_query_and_case() {
        assert!(is_markdown_target("a/B.MD"));
        assert!(is_markdown_target("a/b.md?v=2"));
        assert!(!is_markdown_target("a/b.md.html"));
        assert!(!is_markdown_target("https://example.com/"));
    }

    #[test]
    fn unmatched_syntax_degrades_to_text() {
        assert_eq!(plain("[open link `tick"), "<p>[open link `tick</p>");
    }

    #[test]
    fn render_is_deterministic() {
        let input = "# A\n\n- x\n- *y*\n\n> q\n\ntext [l](l.md)";
        for mode in [LinkMode::Plain, LinkMode::ModalAware] {
            assert_eq!(render(input, mode), render(input, mode));
        }
    }
}
