//! Markdown rendering: source markdown → content HTML fragment.
//!
//! Two things distinguish this from a stock `push_html` call:
//!
//! 1. A pre-pass turns the informal page-break conventions (`\pagebreak` or
//!    `<!-- pagebreak -->`) into an explicit marker element the print
//!    stylesheet keys on.
//! 2. Fenced code blocks are intercepted. A block tagged `mermaid` is
//!    emitted as literal escaped text (never markdown-interpreted) so the
//!    composer can promote it into a diagram container; every other tagged
//!    block is syntax-highlighted server-side with syntect.
//!
//! Markdown conversion never fails: malformed input degrades into literal
//! or partially formatted output, which is the conventional no-fail
//! behaviour of CommonMark converters.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Marker element substituted for page-break conventions. The embedded
/// stylesheet maps `.page-break` to `page-break-before: always`.
pub const PAGE_BREAK_MARKER: &str = r#"<div class="page-break"></div>"#;

/// Language tag that marks a fenced block as diagram markup.
pub const DIAGRAM_LANG: &str = "mermaid";

static RE_PAGE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\pagebreak|<!--\s*pagebreak\s*-->").expect("valid regex"));

// Loading the syntect defaults costs tens of milliseconds; share one set
// across all requests.
static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// The syntect theme used for highlighted blocks. Dark, to match the
/// report's code-block styling.
const CODE_THEME: &str = "base16-ocean.dark";

/// Convert a markdown document to an HTML fragment.
pub fn render_markdown(markdown: &str) -> String {
    let substituted = substitute_page_breaks(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(&substituted, options);

    // Fenced code blocks arrive as Start / Text* / End triples. Buffer the
    // text and replace the whole triple with a single pre-rendered Html
    // event; everything else passes through to push_html untouched.
    let mut events: Vec<Event> = Vec::new();
    let mut code_lang: Option<String> = None;
    let mut code_buf = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                code_lang = Some(match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                });
                code_buf.clear();
            }
            Event::Text(text) if code_lang.is_some() => {
                code_buf.push_str(&text);
            }
            Event::End(TagEnd::CodeBlock) => {
                let lang = code_lang.take().unwrap_or_default();
                events.push(Event::Html(render_code_block(&lang, &code_buf).into()));
            }
            other => events.push(other),
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

/// Replace page-break conventions with [`PAGE_BREAK_MARKER`].
pub fn substitute_page_breaks(markdown: &str) -> String {
    RE_PAGE_BREAK
        .replace_all(markdown, PAGE_BREAK_MARKER)
        .to_string()
}

/// Render one fenced code block to HTML.
///
/// Diagram blocks stay literal text so mermaid can read them via
/// `textContent`; highlighting them would corrupt the diagram source.
fn render_code_block(lang: &str, code: &str) -> String {
    if lang == DIAGRAM_LANG {
        return format!(
            "<pre><code class=\"language-mermaid\">{}</code></pre>\n",
            html_escape(code)
        );
    }

    if !lang.is_empty() {
        if let Some(syntax) = SYNTAX_SET.find_syntax_by_token(lang) {
            let theme = &THEME_SET.themes[CODE_THEME];
            match highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme) {
                Ok(highlighted) => return highlighted,
                Err(e) => {
                    tracing::warn!("Highlighting failed for '{}' block: {}", lang, e);
                }
            }
        }
    }

    plain_code_block(lang, code)
}

/// Fallback: escaped code block with a `language-*` class when tagged.
fn plain_code_block(lang: &str, code: &str) -> String {
    if lang.is_empty() {
        format!("<pre><code>{}</code></pre>\n", html_escape(code))
    } else {
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            html_escape(lang),
            html_escape(code)
        )
    }
}

/// Escape HTML special characters.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_sequence_becomes_marker() {
        let html = render_markdown("before\n\n\\pagebreak\n\nafter");
        assert!(html.contains(PAGE_BREAK_MARKER), "got: {html}");
    }

    #[test]
    fn comment_convention_becomes_marker() {
        let html = render_markdown("before\n\n<!-- pagebreak -->\n\nafter");
        assert!(html.contains(PAGE_BREAK_MARKER), "got: {html}");
        assert!(!html.contains("<!-- pagebreak -->"));
    }

    #[test]
    fn headings_and_lists_render() {
        let html = render_markdown("# Title\n\n- one\n- two\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn tables_render() {
        let html = render_markdown("| A | B |\n| --- | --- |\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn mermaid_block_is_literal_and_escaped() {
        let html = render_markdown("```mermaid\ngraph TB\nA --> B\n```\n");
        assert!(html.contains("<code class=\"language-mermaid\">"));
        // The arrow must be escaped text, never interpreted as markup.
        assert!(html.contains("A --&gt; B"));
        assert!(!html.contains("A --> B"));
    }

    #[test]
    fn mermaid_content_is_not_markdown_interpreted() {
        let html = render_markdown("```mermaid\n# not a heading\n**not bold**\n```\n");
        assert!(!html.contains("<h1>"));
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn known_language_is_highlighted() {
        let html = render_markdown("```rust\nfn main() {}\n```\n");
        // syntect emits inline-styled spans inside a <pre>.
        assert!(html.contains("<pre"));
        assert!(html.contains("span"), "expected highlighted spans, got: {html}");
    }

    #[test]
    fn unknown_language_falls_back_to_plain_block() {
        let html = render_markdown("```nosuchlang\nx < y\n```\n");
        assert!(html.contains("class=\"language-nosuchlang\""));
        assert!(html.contains("x &lt; y"));
    }

    #[test]
    fn malformed_markdown_degrades_without_error() {
        let html = render_markdown("**unterminated\n\n[broken](link\n\n``` also unclosed");
        assert!(!html.is_empty());
    }

    #[test]
    fn plain_html_fragment_passes_through_unchanged() {
        let fragment = "<div>hello <span>world</span></div>\n";
        let html = render_markdown(fragment);
        assert_eq!(html, fragment);
    }
}
