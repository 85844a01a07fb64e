#![allow(clippy::result_large_err)] // Render APIs return AppError to preserve redirect and filter context.

use crate::core::context::RenderContext;
use crate::core::error::AppError;
use crate::core::filters::FilterChain;
use crate::core::plugins::PluginRegistry;
use tracing::debug;

pub mod document;
pub mod headings;
pub mod html;
pub mod parser;

pub use document::WikiDocument;
pub use headings::{Heading, HeadingLevel};
pub use parser::MarkupParser;

/// Orchestrates one page translation: pre-translate filters, markup parsing
/// (plugins executed inline), HTML serialization, post-translate filters.
#[derive(Clone)]
pub struct MarkupRenderer {
    filters: FilterChain,
    plugins: PluginRegistry,
    max_body_chars: usize,
}

impl MarkupRenderer {
    pub fn new(filters: FilterChain, plugins: PluginRegistry) -> Self {
        Self {
            filters,
            plugins,
            max_body_chars: crate::core::config::DEFAULT_MAX_BODY_CHARS,
        }
    }

    /// Cap the body text a single plugin invocation may carry, per
    /// `plugins.max_body_chars`.
    pub fn with_max_body_chars(mut self, limit: usize) -> Self {
        self.max_body_chars = limit;
        self
    }

    /// Render raw wiki markup to HTML. Deterministic for identical markup,
    /// context variables, and plugin state. A filter redirect aborts the
    /// pipeline and surfaces as a `RedirectError`.
    pub fn render(&self, ctx: &mut RenderContext, raw: &str) -> Result<String, AppError> {
        debug!(page = ctx.page_name(), "rendering page");
        let filtered = self.filters.run_pre_translate(ctx, raw.to_string())?;
        let document = MarkupParser::new(ctx, &self.plugins)
            .with_max_body_chars(self.max_body_chars)
            .parse(&filtered)?;
        let html = html::render_document(&document);
        self.filters.run_post_translate(ctx, html)
    }

    /// Parse without serializing; useful when only the document tree or the
    /// heading records are needed.
    pub fn parse(&self, ctx: &mut RenderContext, raw: &str) -> Result<WikiDocument, AppError> {
        let filtered = self.filters.run_pre_translate(ctx, raw.to_string())?;
        MarkupParser::new(ctx, &self.plugins)
            .with_max_body_chars(self.max_body_chars)
            .parse(&filtered)
    }

    pub fn filter_chain(&self) -> &FilterChain {
        &self.filters
    }

    pub fn plugin_registry(&self) -> &PluginRegistry {
        &self.plugins
    }
}
