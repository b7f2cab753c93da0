//! HTML export rendering.
//!
//! Markdown is rendered with pulldown-cmark. Raw HTML in the source is
//! escaped rather than passed through, because the markdown may quote
//! content from the analyzed (untrusted) repository. Mermaid code blocks
//! become `<div class="mermaid">` containers rendered client-side.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

const MERMAID_SCRIPT: &str = r#"<script type="module">
import mermaid from "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.esm.min.mjs";
mermaid.initialize({ startOnLoad: true, securityLevel: "strict" });
</script>"#;

const STYLE: &str = r#"<style>
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; line-height: 1.5; }
pre { background: #f6f8fa; padding: 1rem; overflow-x: auto; }
table { border-collapse: collapse; }
th, td { border: 1px solid #d0d7de; padding: 0.3rem 0.6rem; }
.mermaid { margin: 1rem 0; }
</style>"#;

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_diagram_info(info: &str) -> bool {
    info.split_whitespace().next() == Some("mermaid")
}

/// Container element for a diagram source.
pub fn diagram_block(source: &str) -> String {
    format!(
        "<div class=\"mermaid\">\n{}\n</div>\n",
        escape_html(source.trim())
    )
}

/// Escaped preformatted block for non-markdown text.
pub fn preformatted(text: &str) -> String {
    format!("<pre><code>{}</code></pre>\n", escape_html(text))
}

/// Render markdown to an HTML fragment.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut events: Vec<Event> = Vec::new();
    let mut diagram: Option<String> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info)))
                if is_diagram_info(info) =>
            {
                diagram = Some(String::new());
            }
            Event::Text(ref text) if diagram.is_some() => {
                if let Some(buf) = diagram.as_mut() {
                    buf.push_str(text);
                }
            }
            Event::End(TagEnd::CodeBlock) if diagram.is_some() => {
                if let Some(source) = diagram.take() {
                    events.push(Event::Html(CowStr::from(diagram_block(&source))));
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

/// Wrap a fragment in a standalone page.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}\n</head>\n<body>\n{}{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body,
        MERMAID_SCRIPT
    )
}

/// Index page linking every exported file. Entries are `(href, label)`.
pub fn index_page(title: &str, entries: &[(String, String)]) -> String {
    let mut body = format!("<h1>{}</h1>\n<ul>\n", escape_html(title));
    for (href, label) in entries {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(href),
            escape_html(label)
        ));
    }
    body.push_str("</ul>\n");
    page(title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("# Title\n\n<script>alert('x')</script>\n\ninline <b>bold</b> text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;"));
    }

    #[test]
    fn test_mermaid_block_becomes_container() {
        let html = render_markdown("Intro\n\n```mermaid\ngraph TD\n  A-->B\n```\n\n```rust\nfn main() {}\n```\n");
        assert!(html.contains("<div class=\"mermaid\">\ngraph TD\n  A--&gt;B\n</div>"));
        assert!(!html.contains("language-mermaid"));
        // other code blocks are rendered normally
        assert!(html.contains("<code class=\"language-rust\">"));
    }

    #[test]
    fn test_tables_rendered() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_preformatted_and_diagram_escape() {
        assert_eq!(
            preformatted("a < b && c"),
            "<pre><code>a &lt; b &amp;&amp; c</code></pre>\n"
        );
        assert_eq!(diagram_block("A-->B\n"), "<div class=\"mermaid\">\nA--&gt;B\n</div>\n");
    }

    #[test]
    fn test_index_page_links() {
        let page = index_page(
            "demo <report>",
            &[("docs/OVERVIEW.html".to_string(), "docs/OVERVIEW.md".to_string())],
        );
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>demo &lt;report&gt;</title>"));
        assert!(page.contains("<a href=\"docs/OVERVIEW.html\">docs/OVERVIEW.md</a>"));
    }
}
