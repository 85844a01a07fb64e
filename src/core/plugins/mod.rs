#![allow(clippy::result_large_err)] // Plugin APIs return AppError directly for structured diagnostics without boxing.

use crate::core::context::RenderContext;
use crate::core::error::AppError;

pub mod builtin;
pub mod params;
pub mod registry;

pub use params::{PluginParameters, PARAM_BODY};
pub use registry::{PluginRegistration, PluginRegistry, PluginRegistryBuilder};

/// Engine facts handed to a plugin's one-time initializer.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub application_name: String,
    pub release_version: String,
}

/// Executable unit resolved by name during markup parsing.
///
/// Plugins are registered once at startup and shared across request threads;
/// `execute` must be thread-safe. The optional initializer runs exactly once
/// per process before the first `execute`, never again.
pub trait WikiPlugin: Send + Sync + 'static {
    /// Canonical plugin name used in invocation syntax.
    fn name(&self) -> &'static str;

    /// One-time setup. Only invoked when the registration declares an
    /// initializer capability.
    fn initialize(&self, _engine: &EngineInfo) -> Result<(), AppError> {
        Ok(())
    }

    /// Produce the rendered HTML fragment for one invocation.
    fn execute(
        &self,
        ctx: &mut RenderContext,
        params: &PluginParameters,
    ) -> Result<String, AppError>;
}

/// Inline marker substituted for a failed or unknown plugin invocation.
/// One misbehaving plugin must not take down page rendering.
pub fn error_fragment(plugin: &str, message: &str) -> String {
    format!(
        "<span class=\"error\">Plugin insertion failed: {}: {}</span>",
        crate::core::render::html::escape(plugin),
        crate::core::render::html::escape(message)
    )
}
