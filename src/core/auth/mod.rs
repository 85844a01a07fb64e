use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Identity bound to a workflow actor or a page author.
///
/// The surrounding application supplies these; the pipeline never
/// authenticates anyone itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    name: String,
}

impl Principal {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Principal {
    fn from(name: &str) -> Self {
        Principal::new(name)
    }
}

/// Authorization collaborator validating that a caller may resolve a
/// pending decision assigned to `actor`.
pub trait Authorizer: Send + Sync + 'static {
    fn may_decide(&self, caller: &Principal, actor: &Principal) -> bool;
}

/// Default policy: only the assigned actor may decide.
pub struct ActorOnlyAuthorizer;

impl Authorizer for ActorOnlyAuthorizer {
    fn may_decide(&self, caller: &Principal, actor: &Principal) -> bool {
        caller == actor
    }
}

/// A user profile as staged by the profile-save workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login_name: String,
    pub full_name: String,
    pub email: String,
}

impl UserProfile {
    pub fn new<T: Into<String>>(login_name: T, full_name: T, email: T) -> Self {
        Self {
            login_name: login_name.into(),
            full_name: full_name.into(),
            email: email.into(),
        }
    }
}

/// Backing store for user profiles. The engine only ever writes through
/// this seam; lookups stay with the surrounding application.
pub trait ProfileStore: Send + Sync + 'static {
    fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError>;

    fn get_profile(&self, login_name: &str) -> Result<Option<UserProfile>, AppError>;
}

/// In-memory store used by tests and the demo CLI.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let mut profiles = self.profiles.write().map_err(|_| store_poisoned())?;
        profiles.insert(profile.login_name.clone(), profile.clone());
        Ok(())
    }

    fn get_profile(&self, login_name: &str) -> Result<Option<UserProfile>, AppError> {
        let profiles = self.profiles.read().map_err(|_| store_poisoned())?;
        Ok(profiles.get(login_name).cloned())
    }
}

fn store_poisoned() -> AppError {
    AppError::new(
        ErrorCategory::ProviderError,
        "profile store lock poisoned by a panicked thread",
    )
    .with_code("PROF-LOCK-001")
}
