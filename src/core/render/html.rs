//! HTML serialization of the document tree.

use super::document::{Block, Inline, ListItem, ListKind, WikiDocument};

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Href for a link target: external URLs pass through, anything else is an
/// internal page reference under /wiki/.
pub fn link_href(target: &str) -> String {
    if target.contains("://") || target.starts_with('#') {
        target.to_string()
    } else {
        format!("/wiki/{}", target.replace(' ', ""))
    }
}

/// Serialize a document tree to an HTML string.
pub fn render_document(document: &WikiDocument) -> String {
    let mut out = String::new();
    for block in &document.blocks {
        render_block(block, &mut out);
    }
    out
}

fn render_block(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph { content } => {
            out.push_str("<p>");
            render_inlines(content, out);
            out.push_str("</p>\n");
        }
        Block::Heading {
            level,
            content,
            anchor,
        } => {
            let h = level.html_level();
            out.push_str(&format!("<h{} id=\"{}\">", h, escape(anchor)));
            render_inlines(content, out);
            out.push_str(&format!("</h{}>\n", h));
        }
        Block::Preformatted { content } => {
            out.push_str("<pre>");
            out.push_str(&escape(content));
            out.push_str("</pre>\n");
        }
        Block::List { kind, items } => {
            render_list(*kind, items, out);
        }
        Block::HorizontalRule => out.push_str("<hr />\n"),
        Block::RawFragment { html } => {
            out.push_str(html);
            out.push('\n');
        }
    }
}

fn list_tag(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Unordered => "ul",
        ListKind::Ordered => "ol",
    }
}

fn render_list(kind: ListKind, items: &[ListItem], out: &mut String) {
    let tag = list_tag(kind);
    let mut depth = 0usize;
    for item in items {
        while depth < item.depth {
            out.push_str(&format!("<{}>", tag));
            depth += 1;
        }
        while depth > item.depth {
            out.push_str(&format!("</{}>", tag));
            depth -= 1;
        }
        out.push_str("<li>");
        render_inlines(&item.content, out);
        out.push_str("</li>");
    }
    while depth > 0 {
        out.push_str(&format!("</{}>", tag));
        depth -= 1;
    }
    out.push('\n');
}

fn render_inlines(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape(text)),
            Inline::Bold(content) => {
                out.push_str("<b>");
                render_inlines(content, out);
                out.push_str("</b>");
            }
            Inline::Italic(content) => {
                out.push_str("<i>");
                render_inlines(content, out);
                out.push_str("</i>");
            }
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape(code));
                out.push_str("</code>");
            }
            Inline::Link { text, target } => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape(&link_href(target)),
                    escape(text)
                ));
            }
            Inline::Raw(html) => out.push_str(html),
        }
    }
}
