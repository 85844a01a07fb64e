use serde::{Deserialize, Serialize};

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;

/// Plugin body size accepted by the parser when no limit is configured.
pub const DEFAULT_MAX_BODY_CHARS: usize = 65_536;

/// Main engine configuration loaded from ferrowiki.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Engine identity and release version
    #[serde(default)]
    pub engine: EngineSection,

    /// Plugin execution configuration
    #[serde(default)]
    pub plugins: PluginSection,

    /// Module manifest handling configuration
    #[serde(default)]
    pub modules: ModuleSection,

    /// Save-approval workflow configuration
    #[serde(default)]
    pub approvals: ApprovalSection,

    /// Built-in filter configuration
    #[serde(default)]
    pub filters: FilterSection,
}

/// Engine identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    /// Application name reported in rendered error fragments
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Release version compared against module version bounds
    #[serde(default = "default_release_version")]
    pub release_version: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            release_version: default_release_version(),
        }
    }
}

/// Plugin execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSection {
    /// Global switch: when false, plugin tags render as passthrough text
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum characters of a plugin body accepted by the parser
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
}

impl Default for PluginSection {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_chars: default_max_body_chars(),
        }
    }
}

/// Module manifest handling configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModuleSection {
    /// Admit modules whose version bounds exclude the running engine
    #[serde(default)]
    pub allow_incompatible: bool,
}

/// Save-approval workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApprovalSection {
    /// Principal responsible for approving page saves; None disables approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_save_approver: Option<String>,

    /// Principal responsible for approving profile saves; None disables approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_save_approver: Option<String>,
}

/// Built-in filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSection {
    /// Words masked by the profanity filter during pre-translate
    #[serde(default = "default_profanity_words")]
    pub profanity_words: Vec<String>,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            profanity_words: default_profanity_words(),
        }
    }
}

fn default_application_name() -> String {
    "ferrowiki".to_string()
}

fn default_release_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_body_chars() -> usize {
    DEFAULT_MAX_BODY_CHARS
}

fn default_profanity_words() -> Vec<String> {
    Vec::new()
}
