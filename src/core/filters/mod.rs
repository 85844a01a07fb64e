#![allow(clippy::result_large_err)] // Filter hooks return AppError directly for structured diagnostics without boxing.

use crate::core::context::RenderContext;
use crate::core::error::AppError;
use std::collections::HashMap;

pub mod builtin;
pub mod chain;

pub use builtin::ProfanityFilter;
pub use chain::{FilterChain, FilterChainBuilder, PostSaveFailure};

/// Content filter invoked around page translation and page save.
///
/// Filters are instantiated once at startup from the module manifest, shared
/// across request threads for the life of the engine, and destroyed at
/// shutdown. Every hook has a passthrough default, so a filter implements
/// only the stages it cares about.
pub trait PageFilter: Send + Sync + 'static {
    /// Filter name used in manifests and diagnostics.
    fn name(&self) -> &'static str;

    /// One-time setup with the properties declared in the manifest.
    fn initialize(&mut self, _properties: &HashMap<String, String>) -> Result<(), AppError> {
        Ok(())
    }

    /// Transform raw markup before parsing. An error aborts the chain; a
    /// redirect error additionally carries a target location.
    fn pre_translate(
        &self,
        _ctx: &mut RenderContext,
        content: String,
    ) -> Result<String, AppError> {
        Ok(content)
    }

    /// Transform rendered HTML after serialization.
    fn post_translate(
        &self,
        _ctx: &mut RenderContext,
        content: String,
    ) -> Result<String, AppError> {
        Ok(content)
    }

    /// Transform proposed page text before it is committed.
    fn pre_save(&self, _ctx: &mut RenderContext, content: String) -> Result<String, AppError> {
        Ok(content)
    }

    /// Side-effect hook after a save has been committed. Failures here are
    /// reported but never unwind the save.
    fn post_save(&self, _ctx: &mut RenderContext, _content: &str) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once at engine shutdown.
    fn destroy(&self) {}
}
