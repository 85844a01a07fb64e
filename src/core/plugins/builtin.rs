use super::{EngineInfo, PluginParameters, WikiPlugin};
use crate::core::context::RenderContext;
use crate::core::error::AppError;
use crate::core::render::html;
use crate::core::types::ErrorCategory;
use serde_json::json;
use tracing::debug;

/// Returns its `text` parameter verbatim (HTML-escaped).
#[derive(Default)]
pub struct EchoPlugin;

impl WikiPlugin for EchoPlugin {
    fn name(&self) -> &'static str {
        "Echo"
    }

    fn execute(
        &self,
        _ctx: &mut RenderContext,
        params: &PluginParameters,
    ) -> Result<String, AppError> {
        let text = params.get("text").ok_or_else(|| {
            AppError::new(
                ErrorCategory::PluginError,
                "Echo requires a 'text' parameter",
            )
        })?;
        Ok(html::escape(text))
    }
}

/// Named per-render counter stored in the context variables. Each invocation
/// increments and prints the counter, so repeated tags number themselves.
#[derive(Default)]
pub struct CounterPlugin;

impl WikiPlugin for CounterPlugin {
    fn name(&self) -> &'static str {
        "Counter"
    }

    fn execute(
        &self,
        ctx: &mut RenderContext,
        params: &PluginParameters,
    ) -> Result<String, AppError> {
        let name = params.get("name").unwrap_or("counter");
        let variable = format!("counter.{}", name);
        let next = ctx
            .get_variable(&variable)
            .and_then(|value| value.as_i64())
            .unwrap_or(0)
            + 1;
        ctx.set_variable(variable, json!(next));
        Ok(next.to_string())
    }
}

/// Renders the headings collected so far as a nested-free list of section
/// links. Appearing mid-document, it sees only the headings above it.
#[derive(Default)]
pub struct TableOfContentsPlugin;

impl WikiPlugin for TableOfContentsPlugin {
    fn name(&self) -> &'static str {
        "TableOfContents"
    }

    fn initialize(&self, engine: &EngineInfo) -> Result<(), AppError> {
        debug!(
            application = %engine.application_name,
            "table of contents plugin initialized"
        );
        Ok(())
    }

    fn execute(
        &self,
        ctx: &mut RenderContext,
        params: &PluginParameters,
    ) -> Result<String, AppError> {
        let title = params.get("title").unwrap_or("Table of Contents");
        let mut out = String::new();
        out.push_str("<div class=\"toc\">");
        out.push_str(&format!("<h4>{}</h4>", html::escape(title)));
        out.push_str("<ul>");
        for heading in ctx.headings() {
            out.push_str(&format!(
                "<li class=\"toc-{}\"><a href=\"{}\">{}</a></li>",
                heading.level.as_str(),
                heading.section_link,
                html::escape(&heading.text)
            ));
        }
        out.push_str("</ul></div>");
        Ok(out)
    }
}
