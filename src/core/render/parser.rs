#![allow(clippy::result_large_err)]

//! Wiki markup to document tree.
//!
//! Syntax: `!!!`/`!!`/`!` headings, `__bold__`, `''italic''`, `{{code}}`,
//! `{{{preformatted}}}`, `[link]` / `[text|target]`, `*`/`#` lists, `----`
//! rules, blank-line paragraphs, and `[{Plugin ...}]` invocations executed
//! through the plugin registry as they are encountered.

use super::document::{Block, Inline, ListItem, ListKind, WikiDocument};
use super::headings::{Heading, HeadingLevel};
use crate::core::context::RenderContext;
use crate::core::error::AppError;
use crate::core::plugins::{error_fragment, PluginParameters, PluginRegistry};

// Private-use sentinels bracketing an extracted-region index. Raw page text
// has them stripped before scanning so they can never be forged.
const MARK_START: char = '\u{e000}';
const MARK_END: char = '\u{e001}';

enum Extract {
    Preformatted(String),
    Plugin(String),
}

pub struct MarkupParser<'a> {
    ctx: &'a mut RenderContext,
    plugins: &'a PluginRegistry,
    extracts: Vec<Extract>,
    max_body_chars: usize,
}

impl<'a> MarkupParser<'a> {
    pub fn new(ctx: &'a mut RenderContext, plugins: &'a PluginRegistry) -> Self {
        Self {
            ctx,
            plugins,
            extracts: Vec::new(),
            max_body_chars: crate::core::config::DEFAULT_MAX_BODY_CHARS,
        }
    }

    /// Cap the `_body` text a single plugin invocation may carry. Oversized
    /// bodies render as the inline error fragment instead of executing.
    pub fn with_max_body_chars(mut self, limit: usize) -> Self {
        self.max_body_chars = limit;
        self
    }

    /// Parse raw markup into a document tree, executing plugin tags in
    /// document order (or passing them through when plugins are disabled).
    pub fn parse(mut self, raw: &str) -> Result<WikiDocument, AppError> {
        let normalized: String = raw
            .replace("\r\n", "\n")
            .chars()
            .filter(|c| *c != MARK_START && *c != MARK_END)
            .collect();
        let masked = self.extract_regions(&normalized);

        let mut document = WikiDocument::new(self.ctx.page_name().to_string());
        let mut paragraph: Vec<String> = Vec::new();
        let mut list_items: Vec<ListItem> = Vec::new();
        let mut list_kind: Option<ListKind> = None;

        let lines: Vec<&str> = masked.lines().collect();
        for line in lines {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                self.flush_paragraph(&mut paragraph, &mut document)?;
                Self::flush_list(&mut list_items, &mut list_kind, &mut document);
                continue;
            }

            if let Some((kind, depth, rest)) = parse_list_line(trimmed) {
                self.flush_paragraph(&mut paragraph, &mut document)?;
                if list_kind.is_some() && list_kind != Some(kind) {
                    Self::flush_list(&mut list_items, &mut list_kind, &mut document);
                }
                list_kind = Some(kind);
                list_items.push(ListItem {
                    depth,
                    content: self.parse_inlines(rest)?,
                });
                continue;
            }

            self.flush_paragraph_if_breaking(trimmed, &mut paragraph, &mut document)?;
            Self::flush_list(&mut list_items, &mut list_kind, &mut document);

            if let Some((level, rest)) = parse_heading_line(trimmed) {
                let content = self.parse_inlines(rest)?;
                let text = plain_text_of(&content);
                let heading = Heading::new(level, &text, self.ctx.page_name());
                let anchor = heading.anchor.clone();
                self.ctx.push_heading(heading);
                document.blocks.push(Block::Heading {
                    level,
                    content,
                    anchor,
                });
                continue;
            }

            if trimmed.len() >= 4 && trimmed.chars().all(|c| c == '-') {
                document.blocks.push(Block::HorizontalRule);
                continue;
            }

            if let Some(index) = sole_placeholder(trimmed) {
                match &self.extracts[index] {
                    Extract::Preformatted(content) => {
                        document.blocks.push(Block::Preformatted {
                            content: content.clone(),
                        });
                    }
                    Extract::Plugin(interior) => {
                        if self.ctx.plugins_enabled() {
                            let html = self.run_plugin(&interior.clone());
                            document.blocks.push(Block::RawFragment { html });
                        } else {
                            // Literal passthrough; must not re-enter inline
                            // parsing or the bracket reads as a link.
                            document.blocks.push(Block::Paragraph {
                                content: vec![Inline::Text(format!("[{{{}}}]", interior))],
                            });
                        }
                    }
                }
                continue;
            }

            paragraph.push(trimmed.to_string());
        }

        self.flush_paragraph(&mut paragraph, &mut document)?;
        Self::flush_list(&mut list_items, &mut list_kind, &mut document);
        Ok(document)
    }

    /// Heading and rule lines end any open paragraph.
    fn flush_paragraph_if_breaking(
        &mut self,
        trimmed: &str,
        paragraph: &mut Vec<String>,
        document: &mut WikiDocument,
    ) -> Result<(), AppError> {
        let breaking = trimmed.starts_with('!')
            || (trimmed.len() >= 4 && trimmed.chars().all(|c| c == '-'))
            || sole_placeholder(trimmed).is_some();
        if breaking {
            self.flush_paragraph(paragraph, document)?;
        }
        Ok(())
    }

    fn flush_paragraph(
        &mut self,
        paragraph: &mut Vec<String>,
        document: &mut WikiDocument,
    ) -> Result<(), AppError> {
        if paragraph.is_empty() {
            return Ok(());
        }
        let text = paragraph.join(" ");
        paragraph.clear();
        let content = self.parse_inlines(&text)?;
        if !content.is_empty() {
            document.blocks.push(Block::Paragraph { content });
        }
        Ok(())
    }

    fn flush_list(
        list_items: &mut Vec<ListItem>,
        list_kind: &mut Option<ListKind>,
        document: &mut WikiDocument,
    ) {
        if let Some(kind) = list_kind.take() {
            if !list_items.is_empty() {
                document.blocks.push(Block::List {
                    kind,
                    items: std::mem::take(list_items),
                });
            }
        }
    }

    /// Replace `{{{...}}}` and `[{...}]` regions with indexed sentinels so
    /// line-based parsing never looks inside them. Unterminated regions are
    /// left as literal text.
    fn extract_regions(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        loop {
            let pre = rest.find("{{{");
            let plugin = rest.find("[{");
            let (start, is_pre) = match (pre, plugin) {
                (Some(p), Some(g)) if p < g => (p, true),
                (Some(p), None) => (p, true),
                (_, Some(g)) => (g, false),
                (None, None) => break,
            };
            let (open_len, close) = if is_pre { (3, "}}}") } else { (2, "}]") };
            let interior_start = start + open_len;
            match rest[interior_start..].find(close) {
                Some(offset) => {
                    out.push_str(&rest[..start]);
                    let interior = &rest[interior_start..interior_start + offset];
                    let index = self.extracts.len();
                    self.extracts.push(if is_pre {
                        Extract::Preformatted(interior.to_string())
                    } else {
                        Extract::Plugin(interior.to_string())
                    });
                    out.push(MARK_START);
                    out.push_str(&index.to_string());
                    out.push(MARK_END);
                    rest = &rest[interior_start + offset + close.len()..];
                }
                None => {
                    // No closing marker anywhere ahead; emit through the
                    // opening marker and keep scanning after it.
                    out.push_str(&rest[..interior_start]);
                    rest = &rest[interior_start..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn run_plugin(&mut self, interior: &str) -> String {
        match PluginParameters::parse_invocation(interior) {
            Ok((name, params)) => {
                let body_chars = params.body().map_or(0, |body| body.chars().count());
                if body_chars > self.max_body_chars {
                    return error_fragment(
                        &name,
                        &format!(
                            "plugin body of {} characters exceeds the limit of {}",
                            body_chars, self.max_body_chars
                        ),
                    );
                }
                self.plugins.invoke(&name, self.ctx, &params)
            }
            Err(err) => error_fragment("?", &err.message),
        }
    }

    /// Parse flowing text into inline elements. Unterminated markup falls
    /// back to literal text.
    fn parse_inlines(&mut self, text: &str) -> Result<Vec<Inline>, AppError> {
        let mut inlines = Vec::new();
        let mut buffer = String::new();
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == MARK_START {
                if let Some((index, next)) = read_placeholder(&chars, i) {
                    flush_text(&mut buffer, &mut inlines);
                    match &self.extracts[index] {
                        Extract::Preformatted(content) => {
                            inlines.push(Inline::Code(content.clone()));
                        }
                        Extract::Plugin(interior) => {
                            if self.ctx.plugins_enabled() {
                                let html = self.run_plugin(&interior.clone());
                                inlines.push(Inline::Raw(html));
                            } else {
                                inlines.push(Inline::Text(format!("[{{{}}}]", interior)));
                            }
                        }
                    }
                    i = next;
                    continue;
                }
                i += 1;
                continue;
            }

            if starts_with(&chars, i, "{{") {
                if let Some(end) = find_seq(&chars, i + 2, "}}") {
                    flush_text(&mut buffer, &mut inlines);
                    let code: String = chars[i + 2..end].iter().collect();
                    inlines.push(Inline::Code(code));
                    i = end + 2;
                    continue;
                }
            }

            if starts_with(&chars, i, "__") {
                if let Some(end) = find_seq(&chars, i + 2, "__") {
                    flush_text(&mut buffer, &mut inlines);
                    let interior: String = chars[i + 2..end].iter().collect();
                    inlines.push(Inline::Bold(self.parse_inlines(&interior)?));
                    i = end + 2;
                    continue;
                }
            }

            if starts_with(&chars, i, "''") {
                if let Some(end) = find_seq(&chars, i + 2, "''") {
                    flush_text(&mut buffer, &mut inlines);
                    let interior: String = chars[i + 2..end].iter().collect();
                    inlines.push(Inline::Italic(self.parse_inlines(&interior)?));
                    i = end + 2;
                    continue;
                }
            }

            if c == '[' {
                // "[[" is the escape for a literal bracket.
                if starts_with(&chars, i, "[[") {
                    buffer.push('[');
                    i += 2;
                    continue;
                }
                if let Some(end) = find_seq(&chars, i + 1, "]") {
                    flush_text(&mut buffer, &mut inlines);
                    let interior: String = chars[i + 1..end].iter().collect();
                    let (text, target) = match interior.split_once('|') {
                        Some((text, target)) => (text.trim().to_string(), target.trim().to_string()),
                        None => (interior.trim().to_string(), interior.trim().to_string()),
                    };
                    inlines.push(Inline::Link { text, target });
                    i = end + 1;
                    continue;
                }
            }

            buffer.push(c);
            i += 1;
        }

        flush_text(&mut buffer, &mut inlines);
        Ok(inlines)
    }
}

fn flush_text(buffer: &mut String, inlines: &mut Vec<Inline>) {
    if !buffer.is_empty() {
        inlines.push(Inline::Text(std::mem::take(buffer)));
    }
}

fn starts_with(chars: &[char], at: usize, pattern: &str) -> bool {
    pattern
        .chars()
        .enumerate()
        .all(|(offset, p)| chars.get(at + offset) == Some(&p))
}

fn find_seq(chars: &[char], from: usize, pattern: &str) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        if starts_with(chars, i, pattern) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn read_placeholder(chars: &[char], at: usize) -> Option<(usize, usize)> {
    let mut digits = String::new();
    let mut i = at + 1;
    while i < chars.len() && chars[i] != MARK_END {
        digits.push(chars[i]);
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }
    digits.parse::<usize>().ok().map(|index| (index, i + 1))
}

/// A line consisting of exactly one extracted-region placeholder.
fn sole_placeholder(line: &str) -> Option<usize> {
    let chars: Vec<char> = line.chars().collect();
    if chars.first() != Some(&MARK_START) {
        return None;
    }
    match read_placeholder(&chars, 0) {
        Some((index, next)) if next == chars.len() => Some(index),
        _ => None,
    }
}

fn parse_heading_line(line: &str) -> Option<(HeadingLevel, &str)> {
    if !line.starts_with('!') {
        return None;
    }
    let bangs = line.chars().take_while(|c| *c == '!').count();
    let level = match bangs {
        1 => HeadingLevel::Small,
        2 => HeadingLevel::Medium,
        _ => HeadingLevel::Large,
    };
    Some((level, line[bangs.min(3)..].trim_start()))
}

fn parse_list_line(line: &str) -> Option<(ListKind, usize, &str)> {
    let marker = line.chars().next()?;
    let kind = match marker {
        '*' => ListKind::Unordered,
        '#' => ListKind::Ordered,
        _ => return None,
    };
    let depth = line.chars().take_while(|c| *c == marker).count();
    let rest = &line[depth..];
    // A marker without trailing text is bold/placeholder syntax, not a list.
    if !rest.starts_with(' ') && !rest.is_empty() {
        return None;
    }
    Some((kind, depth, rest.trim_start()))
}

/// Plain-text projection of inline content, used for heading records.
pub fn plain_text_of(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Bold(inner) | Inline::Italic(inner) => out.push_str(&plain_text_of(inner)),
            Inline::Code(code) => out.push_str(code),
            Inline::Link { text, .. } => out.push_str(text),
            Inline::Raw(_) => {}
        }
    }
    out
}
