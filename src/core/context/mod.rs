use crate::core::auth::Principal;
use crate::core::render::headings::Heading;
use serde_json::Value;
use std::collections::HashMap;

/// Per-request rendering state.
///
/// One context exists per render or save call; contexts are never shared
/// across threads. Plugins read and write the variable map, the parser
/// appends heading records in document order.
#[derive(Debug, Clone)]
pub struct RenderContext {
    page_name: String,
    author: Option<Principal>,
    variables: HashMap<String, Value>,
    plugins_enabled: bool,
    headings: Vec<Heading>,
}

impl RenderContext {
    pub fn new<T: Into<String>>(page_name: T) -> Self {
        Self {
            page_name: page_name.into(),
            author: None,
            variables: HashMap::new(),
            plugins_enabled: true,
            headings: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: Principal) -> Self {
        self.author = Some(author);
        self
    }

    /// Disable plugin execution for this render; plugin tags pass through
    /// as literal text.
    pub fn with_plugins_disabled(mut self) -> Self {
        self.plugins_enabled = false;
        self
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    pub fn author(&self) -> Option<&Principal> {
        self.author.as_ref()
    }

    pub fn plugins_enabled(&self) -> bool {
        self.plugins_enabled
    }

    pub fn set_plugins_enabled(&mut self, enabled: bool) {
        self.plugins_enabled = enabled;
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable<T: Into<String>>(&mut self, name: T, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Heading records accumulated so far, in document order.
    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    pub(crate) fn push_heading(&mut self, heading: Heading) {
        self.headings.push(heading);
    }
}
