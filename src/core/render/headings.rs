use serde::{Deserialize, Serialize};

/// Heading size in wiki markup: `!` small, `!!` medium, `!!!` large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    Small,
    Medium,
    Large,
}

impl HeadingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::Small => "small",
            HeadingLevel::Medium => "medium",
            HeadingLevel::Large => "large",
        }
    }

    /// HTML element level: large headings are h2, small are h4 (h1 is the
    /// page title, owned by the templating layer).
    pub fn html_level(&self) -> u8 {
        match self {
            HeadingLevel::Large => 2,
            HeadingLevel::Medium => 3,
            HeadingLevel::Small => 4,
        }
    }
}

/// One heading encountered during parsing, recorded in document order for
/// table-of-contents construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    pub anchor: String,
    pub section_link: String,
}

impl Heading {
    pub fn new(level: HeadingLevel, text: &str, page_name: &str) -> Self {
        let anchor = make_anchor(page_name, text);
        let section_link = format!("#{}", anchor);
        Self {
            level,
            text: text.to_string(),
            anchor,
            section_link,
        }
    }
}

/// Build a stable anchor id from the page name and heading text, keeping
/// only characters that are safe in a fragment identifier.
pub fn make_anchor(page_name: &str, text: &str) -> String {
    let mut anchor = String::from("section-");
    anchor.push_str(&sanitize(page_name));
    anchor.push('-');
    anchor.push_str(&sanitize(text));
    anchor
}

fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
