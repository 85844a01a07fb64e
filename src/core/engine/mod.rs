#![allow(clippy::result_large_err)]

use crate::core::auth::{ActorOnlyAuthorizer, Principal, ProfileStore, UserProfile};
use crate::core::config::{validation, EngineConfig};
use crate::core::context::RenderContext;
use crate::core::error::AppError;
use crate::core::filters::builtin::ProfanityFilter;
use crate::core::modules::{ModuleManifest, ModuleRegistrar};
use crate::core::pages::PageProvider;
use crate::core::plugins::EngineInfo;
use crate::core::render::MarkupRenderer;
use crate::core::tasks::{WorkflowBuilder, ATTR_PROFILE_LOGIN, ATTR_SAVED_VERSION};
use crate::core::types::ErrorCategory;
use crate::core::workflow::{Outcome, PendingDecision, WorkflowManager, WorkflowStatus};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Result of a render request. A filter may abort the pipeline with a
/// redirect, which the caller is expected to follow rather than treat as a
/// failure.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Html(String),
    Redirect(String),
}

/// Result of a save request.
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Committed. Page saves carry the resulting version; profile saves
    /// have no version concept.
    Saved { version: Option<u32> },
    /// Suspended on an approval decision; resolve it to proceed.
    PendingApproval { workflow_id: Uuid },
    /// The approver denied the save. Nothing was committed.
    Denied,
    /// A pre-save filter rejected the content. Nothing was committed.
    Rejected { reason: String },
}

/// Facade tying the pipeline together: configuration, the module-built
/// filter chain and plugin registry, the renderer, and the workflow manager.
///
/// One engine exists per installation; request threads share it behind an
/// `Arc`.
pub struct WikiEngine {
    config: EngineConfig,
    renderer: MarkupRenderer,
    provider: Arc<dyn PageProvider>,
    profiles: Arc<dyn ProfileStore>,
    workflows: WorkflowManager,
}

impl WikiEngine {
    /// Build an engine from its configuration and module manifest, with the
    /// builtin modules available to the manifest.
    pub fn new(
        config: EngineConfig,
        manifest: &ModuleManifest,
        provider: Arc<dyn PageProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Result<Self, AppError> {
        let engine_info = EngineInfo {
            application_name: config.engine.application_name.clone(),
            release_version: config.engine.release_version.clone(),
        };
        let mut registrar =
            ModuleRegistrar::with_builtins(engine_info, config.modules.allow_incompatible)?;
        // The configured word list is the fallback when the manifest entry
        // declares no `words` property of its own.
        let words = config.filters.profanity_words.clone();
        registrar.register_filter_factory("ProfanityFilter", move || {
            Box::new(ProfanityFilter::new(words.clone()))
        });
        Self::with_registrar(config, &registrar, manifest, provider, profiles)
    }

    /// Build an engine with a caller-assembled registrar, typically one
    /// extended with application-specific filters and plugins.
    pub fn with_registrar(
        config: EngineConfig,
        registrar: &ModuleRegistrar,
        manifest: &ModuleManifest,
        provider: Arc<dyn PageProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Result<Self, AppError> {
        validation::validate(&config)?;
        let (filters, plugins) = registrar.instantiate(manifest)?;
        info!(
            application = config.engine.application_name.as_str(),
            version = config.engine.release_version.as_str(),
            filters = filters.len(),
            plugins = plugins.len(),
            "engine assembled"
        );
        let renderer = MarkupRenderer::new(filters, plugins)
            .with_max_body_chars(config.plugins.max_body_chars);
        Ok(Self {
            config,
            renderer,
            provider,
            profiles,
            workflows: WorkflowManager::new(Arc::new(ActorOnlyAuthorizer)),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn renderer(&self) -> &MarkupRenderer {
        &self.renderer
    }

    pub fn page_provider(&self) -> &Arc<dyn PageProvider> {
        &self.provider
    }

    pub fn workflow_manager(&self) -> &WorkflowManager {
        &self.workflows
    }

    /// Render a stored page to HTML.
    pub fn render_page(&self, page_name: &str) -> Result<RenderOutcome, AppError> {
        let raw = self.provider.get_page_text(page_name)?.ok_or_else(|| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("no such page: {}", page_name),
            )
            .with_code("ENG-PAGE-001")
        })?;
        self.render_text(page_name, &raw)
    }

    /// Render raw markup in the context of `page_name` without touching the
    /// provider.
    pub fn render_text(&self, page_name: &str, raw: &str) -> Result<RenderOutcome, AppError> {
        let mut ctx = RenderContext::new(page_name);
        if !self.config.plugins.enabled {
            ctx.set_plugins_enabled(false);
        }
        match self.renderer.render(&mut ctx, raw) {
            Ok(html) => Ok(RenderOutcome::Html(html)),
            Err(err) => match err.redirect_location() {
                Some(location) => Ok(RenderOutcome::Redirect(location.to_string())),
                None => Err(err),
            },
        }
    }

    /// Save page text through the page-save workflow. With an approver
    /// configured the save suspends until the approver decides.
    pub fn save_page(
        &self,
        page_name: &str,
        author: Principal,
        proposed_text: String,
    ) -> Result<SaveOutcome, AppError> {
        let approver = self
            .config
            .approvals
            .page_save_approver
            .as_deref()
            .map(Principal::new);
        let workflow = WorkflowBuilder::build_page_save_workflow(
            self.renderer.filter_chain().clone(),
            Arc::clone(&self.provider),
            approver,
            page_name,
            author,
            proposed_text,
        )?;
        self.run_save_workflow(workflow)
    }

    /// Save a user profile through the profile-save workflow.
    pub fn save_profile(
        &self,
        owner: Principal,
        profile: UserProfile,
    ) -> Result<SaveOutcome, AppError> {
        let approver = self
            .config
            .approvals
            .profile_save_approver
            .as_deref()
            .map(Principal::new);
        let workflow = WorkflowBuilder::build_profile_save_workflow(
            Arc::clone(&self.profiles),
            approver,
            owner,
            profile,
        )?;
        self.run_save_workflow(workflow)
    }

    fn run_save_workflow(
        &self,
        workflow: crate::core::workflow::Workflow,
    ) -> Result<SaveOutcome, AppError> {
        match self.workflows.start(workflow) {
            Ok((id, status)) => self.save_outcome(id, status),
            // A rejecting or redirecting filter aborts the workflow before
            // anything is committed; surface that as a save outcome, not a
            // hard failure.
            Err(err)
                if matches!(
                    err.category,
                    ErrorCategory::FilterError | ErrorCategory::RedirectError
                ) =>
            {
                Ok(SaveOutcome::Rejected {
                    reason: err.message,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Resolve a pending approval decision as `caller` and report where the
    /// save ended up.
    pub fn resolve_decision(
        &self,
        workflow_id: Uuid,
        caller: &Principal,
        outcome: Outcome,
    ) -> Result<SaveOutcome, AppError> {
        let status = self.workflows.resolve(workflow_id, caller, outcome)?;
        self.save_outcome(workflow_id, status)
    }

    pub fn reassign_decision(&self, workflow_id: Uuid, actor: Principal) -> Result<(), AppError> {
        self.workflows.reassign(workflow_id, actor)
    }

    pub fn abort_workflow(&self, workflow_id: Uuid) -> Result<(), AppError> {
        self.workflows.abort(workflow_id)
    }

    /// The approval inbox for one actor, oldest first.
    pub fn pending_decisions(&self, actor: &Principal) -> Vec<PendingDecision> {
        self.workflows.pending_for(actor)
    }

    /// Shut down the engine: destroy filters and drop finished workflows.
    pub fn shutdown(&self) {
        self.renderer.filter_chain().destroy_all();
        let pruned = self.workflows.prune_terminated();
        info!(pruned, "engine shut down");
    }

    fn save_outcome(&self, id: Uuid, status: WorkflowStatus) -> Result<SaveOutcome, AppError> {
        match status {
            WorkflowStatus::Waiting => Ok(SaveOutcome::PendingApproval { workflow_id: id }),
            WorkflowStatus::Completed => {
                if let Some(version) = self
                    .workflows
                    .attribute(id, ATTR_SAVED_VERSION)?
                    .and_then(|value| value.as_u64())
                {
                    return Ok(SaveOutcome::Saved {
                        version: Some(version as u32),
                    });
                }
                if self.workflows.attribute(id, ATTR_PROFILE_LOGIN)?.is_some() {
                    return Ok(SaveOutcome::Saved { version: None });
                }
                // Completed without a commit: the approver denied.
                Ok(SaveOutcome::Denied)
            }
            WorkflowStatus::Aborted => Ok(SaveOutcome::Rejected {
                reason: "save workflow was aborted".to_string(),
            }),
            WorkflowStatus::Created | WorkflowStatus::Running => Err(AppError::new(
                ErrorCategory::InternalError,
                format!("workflow {} settled in transient status", id),
            )),
        }
    }
}
