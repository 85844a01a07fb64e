#![allow(clippy::result_large_err)] // Task APIs return AppError so aborted saves carry full context.

use crate::core::auth::{Principal, ProfileStore, UserProfile};
use crate::core::context::RenderContext;
use crate::core::error::AppError;
use crate::core::filters::FilterChain;
use crate::core::pages::PageProvider;
use crate::core::types::ErrorCategory;
use crate::core::workflow::{Decision, Outcome, Task, Workflow, WorkflowContext};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

// Workflow attributes shared between the save tasks and the engine facade.
pub const ATTR_PAGE_NAME: &str = "page.name";
pub const ATTR_AUTHOR: &str = "page.author";
pub const ATTR_PROPOSED_TEXT: &str = "page.proposed_text";
/// Proposed text after the pre-save filter chain ran over it.
pub const ATTR_STAGED_TEXT: &str = "page.staged_text";
pub const ATTR_SAVED_VERSION: &str = "page.saved_version";
pub const ATTR_CONTENT_SHA256: &str = "page.content_sha256";
pub const ATTR_POST_SAVE_FAILURES: &str = "page.post_save_failures";
pub const ATTR_PROFILE_LOGIN: &str = "profile.login_name";

/// Runs the proposed page text through the pre-save filter chain and stages
/// the result for the commit step. A rejecting filter aborts the workflow
/// here, before any approval or commit happens.
pub struct PreSaveWikiPageTask {
    filters: FilterChain,
    page_name: String,
    author: Principal,
    proposed_text: String,
}

impl PreSaveWikiPageTask {
    pub fn new(
        filters: FilterChain,
        page_name: String,
        author: Principal,
        proposed_text: String,
    ) -> Self {
        Self {
            filters,
            page_name,
            author,
            proposed_text,
        }
    }
}

impl Task for PreSaveWikiPageTask {
    fn name(&self) -> &'static str {
        "pre-save-wiki-page"
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> Result<Outcome, AppError> {
        let mut render_ctx =
            RenderContext::new(self.page_name.as_str()).with_author(self.author.clone());
        let staged = self
            .filters
            .run_pre_save(&mut render_ctx, self.proposed_text.clone())?;
        ctx.set_attribute(ATTR_PAGE_NAME, json!(self.page_name));
        ctx.set_attribute(ATTR_AUTHOR, json!(self.author.name()));
        ctx.set_attribute(ATTR_PROPOSED_TEXT, json!(self.proposed_text));
        ctx.set_attribute(ATTR_STAGED_TEXT, json!(staged));
        Ok(Outcome::StepComplete)
    }
}

/// Commits the staged page text to the provider, then runs the post-save
/// hooks. Post-save failures are recorded but never unwind the commit.
pub struct SaveWikiPageTask {
    filters: FilterChain,
    provider: Arc<dyn PageProvider>,
    page_name: String,
    author: Principal,
}

impl SaveWikiPageTask {
    pub fn new(
        filters: FilterChain,
        provider: Arc<dyn PageProvider>,
        page_name: String,
        author: Principal,
    ) -> Self {
        Self {
            filters,
            provider,
            page_name,
            author,
        }
    }
}

impl Task for SaveWikiPageTask {
    fn name(&self) -> &'static str {
        "save-wiki-page"
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> Result<Outcome, AppError> {
        let staged = ctx
            .get_attribute(ATTR_STAGED_TEXT)
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::WorkflowProtocolError,
                    "save task ran without staged page text",
                )
                .with_code("WF-TASK-001")
            })?;

        let info = self
            .provider
            .put_page_text(&self.page_name, &staged, Some(self.author.name()))?;
        let digest = hex::encode(Sha256::digest(staged.as_bytes()));
        info!(
            page = self.page_name.as_str(),
            version = info.version,
            provider = self.provider.provider_info(),
            "page saved"
        );
        ctx.set_attribute(ATTR_SAVED_VERSION, json!(info.version));
        ctx.set_attribute(ATTR_CONTENT_SHA256, json!(digest));

        let mut render_ctx =
            RenderContext::new(self.page_name.as_str()).with_author(self.author.clone());
        let failures = self.filters.run_post_save(&mut render_ctx, &staged);
        if !failures.is_empty() {
            warn!(
                page = self.page_name.as_str(),
                failed = failures.len(),
                "post-save hooks reported failures"
            );
        }
        ctx.set_attribute(ATTR_POST_SAVE_FAILURES, json!(failures.len()));
        Ok(Outcome::StepComplete)
    }
}

/// Commits a staged user profile to the profile store.
pub struct SaveUserProfileTask {
    store: Arc<dyn ProfileStore>,
    profile: UserProfile,
}

impl SaveUserProfileTask {
    pub fn new(store: Arc<dyn ProfileStore>, profile: UserProfile) -> Self {
        Self { store, profile }
    }
}

impl Task for SaveUserProfileTask {
    fn name(&self) -> &'static str {
        "save-user-profile"
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> Result<Outcome, AppError> {
        self.store.save_profile(&self.profile)?;
        info!(login = self.profile.login_name.as_str(), "user profile saved");
        ctx.set_attribute(ATTR_PROFILE_LOGIN, json!(self.profile.login_name));
        Ok(Outcome::StepComplete)
    }
}

/// Assembles the stock approval workflows from their tasks and, when an
/// approver is configured, an interposed approval decision. A denied
/// decision routes to its explicit terminal successor, so the workflow
/// completes without ever reaching the commit step.
pub struct WorkflowBuilder;

impl WorkflowBuilder {
    pub fn build_page_save_workflow(
        filters: FilterChain,
        provider: Arc<dyn PageProvider>,
        approver: Option<Principal>,
        page_name: &str,
        author: Principal,
        proposed_text: String,
    ) -> Result<Workflow, AppError> {
        let mut workflow = Workflow::new(
            format!("save page {}", page_name),
            author.clone(),
        );
        let pre_save = workflow.add_task(Arc::new(PreSaveWikiPageTask::new(
            filters.clone(),
            page_name.to_string(),
            author.clone(),
            proposed_text,
        )));
        let save = workflow.add_task(Arc::new(SaveWikiPageTask::new(
            filters,
            provider,
            page_name.to_string(),
            author.clone(),
        )));
        match approver {
            Some(approver) => {
                let decision = workflow.add_decision(Decision::simple(
                    format!("{} wants to save page {}", author, page_name),
                    approver,
                ));
                workflow.on_outcome(pre_save, Outcome::StepComplete, decision)?;
                workflow.on_outcome(decision, Outcome::DecisionApprove, save)?;
            }
            None => {
                workflow.on_outcome(pre_save, Outcome::StepComplete, save)?;
            }
        }
        workflow.set_first(pre_save);
        Ok(workflow)
    }

    pub fn build_profile_save_workflow(
        store: Arc<dyn ProfileStore>,
        approver: Option<Principal>,
        owner: Principal,
        profile: UserProfile,
    ) -> Result<Workflow, AppError> {
        let mut workflow = Workflow::new(
            format!("save profile {}", profile.login_name),
            owner.clone(),
        );
        let save = workflow.add_task(Arc::new(SaveUserProfileTask::new(store, profile)));
        if let Some(approver) = approver {
            let decision = workflow.add_decision(Decision::simple(
                format!("{} wants to save their profile", owner),
                approver,
            ));
            workflow.on_outcome(decision, Outcome::DecisionApprove, save)?;
            workflow.set_first(decision);
        } else {
            workflow.set_first(save);
        }
        Ok(workflow)
    }
}
