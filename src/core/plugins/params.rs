#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

/// Reserved parameter key holding the untagged plugin body text.
pub const PARAM_BODY: &str = "_body";

/// Parameter mapping for one plugin invocation: the explicit `key=value`
/// pairs in invocation order, plus the reserved `_body` entry when a body
/// was supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginParameters {
    values: IndexMap<String, String>,
}

impl PluginParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn body(&self) -> Option<&str> {
        self.get(PARAM_BODY)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate parameters in invocation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Parse the interior of a plugin tag (`Name key='value' ...` with an
    /// optional body after the first line break) into the plugin name and
    /// its parameter map.
    pub fn parse_invocation(text: &str) -> Result<(String, PluginParameters), AppError> {
        let (header, body) = match text.find('\n') {
            Some(pos) => (&text[..pos], Some(&text[pos + 1..])),
            None => (text, None),
        };

        let header = header.trim();
        if header.is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "plugin invocation is missing a plugin name",
            )
            .with_code("PLG-PARSE-001"));
        }

        let (name, arg_text) = match header.find(char::is_whitespace) {
            Some(pos) => (&header[..pos], &header[pos..]),
            None => (header, ""),
        };

        let mut params = PluginParameters::new();
        for capture in param_pattern().captures_iter(arg_text) {
            let key = capture.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = capture
                .get(2)
                .or_else(|| capture.get(3))
                .or_else(|| capture.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if key == PARAM_BODY {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    format!("parameter name {} is reserved", PARAM_BODY),
                )
                .with_code("PLG-PARSE-002"));
            }
            params.insert(key, value);
        }

        if let Some(body) = body {
            if !body.is_empty() {
                params.insert(PARAM_BODY, body);
            }
        }

        Ok((name.to_string(), params))
    }
}

fn param_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][A-Za-z0-9_-]*)\s*=\s*(?:'([^']*)'|"([^"]*)"|(\S+))"#)
            .expect("plugin parameter pattern is valid")
    })
}
