//! Intermediate document tree built from wiki markup.
//!
//! The tree is format-neutral: the parser produces it, the HTML serializer
//! consumes it, and plugin output is preserved as raw fragments.

use super::headings::HeadingLevel;
use serde::{Deserialize, Serialize};

/// The root document node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiDocument {
    pub page_name: String,
    pub blocks: Vec<Block>,
}

impl WikiDocument {
    pub fn new<T: Into<String>>(page_name: T) -> Self {
        Self {
            page_name: page_name.into(),
            blocks: Vec::new(),
        }
    }
}

/// Block-level elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Vec<Inline>,
    },
    Heading {
        level: HeadingLevel,
        content: Vec<Inline>,
        anchor: String,
    },
    /// Verbatim `{{{ ... }}}` block, rendered without inline processing.
    Preformatted {
        content: String,
    },
    List {
        kind: ListKind,
        items: Vec<ListItem>,
    },
    HorizontalRule,
    /// Pre-rendered fragment (plugin output) standing alone as a block.
    RawFragment {
        html: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Unordered,
    Ordered,
}

/// One list item; depth > 1 nests under the preceding shallower item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    pub depth: usize,
    pub content: Vec<Inline>,
}

/// Inline elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Code(String),
    Link {
        text: String,
        target: String,
    },
    /// Pre-rendered fragment (plugin output) embedded in flowing text.
    Raw(String),
}
