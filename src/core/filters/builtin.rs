use super::PageFilter;
use crate::core::context::RenderContext;
use crate::core::error::AppError;
use std::collections::HashMap;

/// Masks configured words in raw markup before translation.
///
/// The word list comes from the manifest `words` property (comma separated)
/// or, when absent, from `filters.profanity_words` in the engine config.
#[derive(Default)]
pub struct ProfanityFilter {
    words: Vec<String>,
}

impl ProfanityFilter {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    fn mask(word: &str) -> String {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => {
                let rest: String = chars.map(|_| '*').collect();
                format!("{}{}", first, rest)
            }
            None => String::new(),
        }
    }
}

impl PageFilter for ProfanityFilter {
    fn name(&self) -> &'static str {
        "ProfanityFilter"
    }

    fn initialize(&mut self, properties: &HashMap<String, String>) -> Result<(), AppError> {
        if let Some(raw) = properties.get("words") {
            self.words = raw
                .split(',')
                .map(str::trim)
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    fn pre_translate(
        &self,
        _ctx: &mut RenderContext,
        content: String,
    ) -> Result<String, AppError> {
        let mut content = content;
        for word in &self.words {
            if content.contains(word.as_str()) {
                content = content.replace(word.as_str(), &Self::mask(word));
            }
        }
        Ok(content)
    }

    fn pre_save(&self, ctx: &mut RenderContext, content: String) -> Result<String, AppError> {
        // Saved text is masked the same way rendered text is.
        self.pre_translate(ctx, content)
    }
}
