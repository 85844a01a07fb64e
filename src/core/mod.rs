pub mod auth;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod filters;
pub mod modules;
pub mod pages;
pub mod plugins;
pub mod render;
pub mod tasks;
pub mod types;
pub mod workflow;

pub use auth::{
    ActorOnlyAuthorizer, Authorizer, MemoryProfileStore, Principal, ProfileStore, UserProfile,
};
pub use config::{ConfigLoader, EngineConfig};
pub use context::RenderContext;
pub use engine::{RenderOutcome, SaveOutcome, WikiEngine};
pub use error::AppError;
pub use filters::{FilterChain, PageFilter};
pub use modules::{ModuleManifest, ModuleRegistrar};
pub use pages::{MemoryPageProvider, PageInfo, PageProvider};
pub use plugins::{PluginParameters, PluginRegistry, WikiPlugin};
pub use render::MarkupRenderer;
pub use types::{ErrorCategory, ErrorSeverity};
pub use workflow::{Outcome, Workflow, WorkflowManager, WorkflowStatus};
