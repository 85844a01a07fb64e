use ferrowiki::core::auth::{
    ActorOnlyAuthorizer, MemoryProfileStore, Principal, ProfileStore, UserProfile,
};
use ferrowiki::core::config::EngineConfig;
use ferrowiki::core::context::RenderContext;
use ferrowiki::core::engine::{SaveOutcome, WikiEngine};
use ferrowiki::core::error::AppError;
use ferrowiki::core::filters::{FilterChainBuilder, PageFilter};
use ferrowiki::core::modules::{ModuleManifest, ModuleRegistrar};
use ferrowiki::core::pages::{MemoryPageProvider, PageProvider};
use ferrowiki::core::plugins::EngineInfo;
use ferrowiki::core::tasks::{WorkflowBuilder, ATTR_CONTENT_SHA256, ATTR_POST_SAVE_FAILURES};
use ferrowiki::core::types::ErrorCategory;
use ferrowiki::core::workflow::{Outcome, WorkflowManager, WorkflowStatus};
use serde_json::json;
use std::sync::Arc;

fn manifest() -> ModuleManifest {
    ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: ProfanityFilter
    kind: filter
    properties:
      words: "darn"
"#,
    )
    .unwrap()
}

fn engine(config: EngineConfig) -> (WikiEngine, Arc<MemoryPageProvider>, Arc<MemoryProfileStore>) {
    let provider = Arc::new(MemoryPageProvider::new());
    let profiles = Arc::new(MemoryProfileStore::new());
    let engine = WikiEngine::new(
        config,
        &manifest(),
        Arc::clone(&provider) as Arc<dyn PageProvider>,
        Arc::clone(&profiles) as Arc<dyn ProfileStore>,
    )
    .unwrap();
    (engine, provider, profiles)
}

fn approving_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.approvals.page_save_approver = Some("admin".to_string());
    config
}

#[test]
fn save_without_approver_commits_filtered_text() {
    let (engine, provider, _) = engine(EngineConfig::default());
    let outcome = engine
        .save_page("Main", Principal::new("alice"), "darn fine page".to_string())
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { version: Some(1) });
    assert_eq!(
        provider.get_page_text("Main").unwrap().unwrap(),
        "d*** fine page"
    );
}

#[test]
fn save_with_approver_waits_in_the_inbox_then_commits() {
    let (engine, provider, _) = engine(approving_config());
    let outcome = engine
        .save_page("Main", Principal::new("alice"), "needs a nod".to_string())
        .unwrap();
    let workflow_id = match outcome {
        SaveOutcome::PendingApproval { workflow_id } => workflow_id,
        other => panic!("expected pending approval, got {:?}", other),
    };
    assert!(!provider.page_exists("Main"));

    let admin = Principal::new("admin");
    let inbox = engine.pending_decisions(&admin);
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].title.contains("alice"));
    assert!(inbox[0].title.contains("Main"));

    let outcome = engine
        .resolve_decision(workflow_id, &admin, Outcome::DecisionApprove)
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { version: Some(1) });
    assert_eq!(
        provider.get_page_text("Main").unwrap().unwrap(),
        "needs a nod"
    );
    assert!(engine.pending_decisions(&admin).is_empty());
}

#[test]
fn denied_save_commits_nothing() {
    let (engine, provider, _) = engine(approving_config());
    let outcome = engine
        .save_page("Main", Principal::new("alice"), "vetoed".to_string())
        .unwrap();
    let workflow_id = match outcome {
        SaveOutcome::PendingApproval { workflow_id } => workflow_id,
        other => panic!("expected pending approval, got {:?}", other),
    };
    let outcome = engine
        .resolve_decision(workflow_id, &Principal::new("admin"), Outcome::DecisionDeny)
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Denied);
    assert!(!provider.page_exists("Main"));
}

#[test]
fn rejecting_filter_turns_the_save_into_a_rejection() {
    struct NoShoutingFilter;
    impl PageFilter for NoShoutingFilter {
        fn name(&self) -> &'static str {
            "NoShoutingFilter"
        }
        fn pre_save(
            &self,
            _ctx: &mut RenderContext,
            content: String,
        ) -> Result<String, AppError> {
            if content.chars().any(|c| c.is_ascii_uppercase()) {
                return Err(AppError::new(
                    ErrorCategory::FilterError,
                    "shouting is not allowed",
                ));
            }
            Ok(content)
        }
    }

    let manifest = ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: NoShoutingFilter
    kind: filter
"#,
    )
    .unwrap();
    let mut registrar = ModuleRegistrar::new(
        EngineInfo {
            application_name: "TestWiki".to_string(),
            release_version: "0.3.0".to_string(),
        },
        false,
    )
    .unwrap();
    registrar.register_filter_factory("NoShoutingFilter", || Box::new(NoShoutingFilter));

    let provider = Arc::new(MemoryPageProvider::new());
    let engine = WikiEngine::with_registrar(
        EngineConfig::default(),
        &registrar,
        &manifest,
        Arc::clone(&provider) as Arc<dyn PageProvider>,
        Arc::new(MemoryProfileStore::new()),
    )
    .unwrap();

    let outcome = engine
        .save_page("Main", Principal::new("alice"), "WHY ARE WE YELLING".to_string())
        .unwrap();
    match outcome {
        SaveOutcome::Rejected { reason } => assert!(reason.contains("shouting")),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(!provider.page_exists("Main"));
}

#[test]
fn unauthorized_caller_cannot_approve() {
    let (engine, provider, _) = engine(approving_config());
    let outcome = engine
        .save_page("Main", Principal::new("alice"), "text".to_string())
        .unwrap();
    let workflow_id = match outcome {
        SaveOutcome::PendingApproval { workflow_id } => workflow_id,
        other => panic!("expected pending approval, got {:?}", other),
    };
    let err = engine
        .resolve_decision(
            workflow_id,
            &Principal::new("mallory"),
            Outcome::DecisionApprove,
        )
        .unwrap_err();
    assert_eq!(err.code, "WF-AUTH-001");
    assert!(!provider.page_exists("Main"));
}

#[test]
fn post_save_failures_are_recorded_not_fatal() {
    struct FlakyNotifier;
    impl PageFilter for FlakyNotifier {
        fn name(&self) -> &'static str {
            "FlakyNotifier"
        }
        fn post_save(&self, _ctx: &mut RenderContext, _content: &str) -> Result<(), AppError> {
            Err(AppError::new(
                ErrorCategory::FilterError,
                "notification endpoint is down",
            ))
        }
    }

    let mut builder = FilterChainBuilder::new();
    builder.register(Arc::new(FlakyNotifier));
    let provider = Arc::new(MemoryPageProvider::new());
    let workflow = WorkflowBuilder::build_page_save_workflow(
        builder.build(),
        Arc::clone(&provider) as Arc<dyn PageProvider>,
        None,
        "Main",
        Principal::new("alice"),
        "content".to_string(),
    )
    .unwrap();

    let manager = WorkflowManager::new(Arc::new(ActorOnlyAuthorizer));
    let (id, status) = manager.start(workflow).unwrap();
    assert_eq!(status, WorkflowStatus::Completed);
    // The save committed despite the failing hook, and the failure count is
    // on the record.
    assert_eq!(provider.get_page_text("Main").unwrap().unwrap(), "content");
    assert_eq!(
        manager.attribute(id, ATTR_POST_SAVE_FAILURES).unwrap(),
        Some(json!(1))
    );
    assert!(manager
        .attribute(id, ATTR_CONTENT_SHA256)
        .unwrap()
        .is_some());
}

#[test]
fn profile_save_with_approver_round_trips() {
    let mut config = EngineConfig::default();
    config.approvals.profile_save_approver = Some("admin".to_string());
    let (engine, _, profiles) = engine(config);

    let outcome = engine
        .save_profile(
            Principal::new("jdoe"),
            UserProfile::new("jdoe", "Jane Doe", "jdoe@example.org"),
        )
        .unwrap();
    let workflow_id = match outcome {
        SaveOutcome::PendingApproval { workflow_id } => workflow_id,
        other => panic!("expected pending approval, got {:?}", other),
    };
    assert!(profiles.get_profile("jdoe").unwrap().is_none());

    let outcome = engine
        .resolve_decision(workflow_id, &Principal::new("admin"), Outcome::DecisionApprove)
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { version: None });
    assert_eq!(
        profiles.get_profile("jdoe").unwrap().unwrap().full_name,
        "Jane Doe"
    );
}

#[test]
fn aborted_save_leaves_no_trace() {
    let (engine, provider, _) = engine(approving_config());
    let outcome = engine
        .save_page("Main", Principal::new("alice"), "abandoned".to_string())
        .unwrap();
    let workflow_id = match outcome {
        SaveOutcome::PendingApproval { workflow_id } => workflow_id,
        other => panic!("expected pending approval, got {:?}", other),
    };
    engine.abort_workflow(workflow_id).unwrap();
    assert!(!provider.page_exists("Main"));
    assert!(engine.pending_decisions(&Principal::new("admin")).is_empty());
}
