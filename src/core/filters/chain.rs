#![allow(clippy::result_large_err)]

use super::PageFilter;
use crate::core::context::RenderContext;
use crate::core::error::AppError;
use crate::core::types::FilterStage;
use std::sync::Arc;
use tracing::{debug, warn};

/// One post-save hook failure, reported without unwinding the save.
#[derive(Debug)]
pub struct PostSaveFailure {
    pub filter: &'static str,
    pub error: AppError,
}

/// Builder used to assemble the filter chain before the engine starts.
/// Registration order is manifest order, which is pipeline order.
#[derive(Default)]
pub struct FilterChainBuilder {
    filters: Vec<Arc<dyn PageFilter>>,
}

impl FilterChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, filter: Arc<dyn PageFilter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn build(self) -> FilterChain {
        FilterChain {
            filters: self.filters.into(),
        }
    }
}

/// Ordered, immutable chain of page filters shared by all request threads.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Arc<[Arc<dyn PageFilter>]>,
}

impl FilterChain {
    pub fn builder() -> FilterChainBuilder {
        FilterChainBuilder::new()
    }

    /// The ordered filter list, read-only.
    pub fn filter_list(&self) -> &[Arc<dyn PageFilter>] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Fold raw markup through every filter's pre_translate hook in order.
    /// The first failing filter aborts the remainder of the chain.
    pub fn run_pre_translate(
        &self,
        ctx: &mut RenderContext,
        content: String,
    ) -> Result<String, AppError> {
        let mut content = content;
        for filter in self.filters.iter() {
            debug!(filter = filter.name(), stage = FilterStage::PreTranslate.as_str(), "running filter");
            content = filter.pre_translate(ctx, content).map_err(|mut err| {
                err.add_context("filter", filter.name());
                err
            })?;
        }
        Ok(content)
    }

    /// Fold rendered HTML through every filter's post_translate hook in order.
    pub fn run_post_translate(
        &self,
        ctx: &mut RenderContext,
        content: String,
    ) -> Result<String, AppError> {
        let mut content = content;
        for filter in self.filters.iter() {
            debug!(filter = filter.name(), stage = FilterStage::PostTranslate.as_str(), "running filter");
            content = filter.post_translate(ctx, content).map_err(|mut err| {
                err.add_context("filter", filter.name());
                err
            })?;
        }
        Ok(content)
    }

    /// Fold proposed page text through every filter's pre_save hook in order.
    pub fn run_pre_save(
        &self,
        ctx: &mut RenderContext,
        content: String,
    ) -> Result<String, AppError> {
        let mut content = content;
        for filter in self.filters.iter() {
            debug!(filter = filter.name(), stage = FilterStage::PreSave.as_str(), "running filter");
            content = filter.pre_save(ctx, content).map_err(|mut err| {
                err.add_context("filter", filter.name());
                err
            })?;
        }
        Ok(content)
    }

    /// Run every filter's post_save hook. The content is already committed,
    /// so a failing hook is logged and the chain keeps going; failures are
    /// returned for the caller's records.
    pub fn run_post_save(&self, ctx: &mut RenderContext, content: &str) -> Vec<PostSaveFailure> {
        let mut failures = Vec::new();
        for filter in self.filters.iter() {
            if let Err(error) = filter.post_save(ctx, content) {
                warn!(
                    filter = filter.name(),
                    error = %error,
                    "post_save filter failed; continuing with remaining filters"
                );
                failures.push(PostSaveFailure {
                    filter: filter.name(),
                    error,
                });
            }
        }
        failures
    }

    /// Shut down every filter, in order.
    pub fn destroy_all(&self) {
        for filter in self.filters.iter() {
            filter.destroy();
        }
    }
}
