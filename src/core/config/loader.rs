use super::EngineConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from a workspace root (workspace/ferrowiki.toml).
    /// Environment variables override config file values.
    /// Missing file means defaults + env vars.
    pub fn load_from_workspace(workspace_path: &Path) -> Result<EngineConfig, AppError> {
        let config_path = workspace_path.join("ferrowiki.toml");
        let config_file = Self::load_from_file(&config_path)?;

        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        super::validation::validate(&config)?;

        Ok(config)
    }

    /// Load config from a specific file path.
    /// Returns Ok(None) if the file doesn't exist.
    pub fn load_from_file(path: &Path) -> Result<Option<EngineConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration.
    /// Environment variables take precedence over config file values.
    fn apply_env_overrides(config: &mut EngineConfig) {
        if let Ok(name) = env::var("FERROWIKI_APPLICATION_NAME") {
            config.engine.application_name = name;
        }

        if let Ok(version) = env::var("FERROWIKI_RELEASE_VERSION") {
            config.engine.release_version = version;
        }

        if let Ok(enabled_str) = env::var("FERROWIKI_PLUGINS_ENABLED") {
            if let Ok(enabled) = enabled_str.parse::<bool>() {
                config.plugins.enabled = enabled;
            }
        }

        if let Ok(allow_str) = env::var("FERROWIKI_MODULES_ALLOW_INCOMPATIBLE") {
            if let Ok(allow) = allow_str.parse::<bool>() {
                config.modules.allow_incompatible = allow;
            }
        }

        if let Ok(approver) = env::var("FERROWIKI_PAGE_SAVE_APPROVER") {
            if approver.is_empty() {
                config.approvals.page_save_approver = None;
            } else {
                config.approvals.page_save_approver = Some(approver);
            }
        }

        if let Ok(approver) = env::var("FERROWIKI_PROFILE_SAVE_APPROVER") {
            if approver.is_empty() {
                config.approvals.profile_save_approver = None;
            } else {
                config.approvals.profile_save_approver = Some(approver);
            }
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "FERROWIKI_APPLICATION_NAME - Override application name",
            "FERROWIKI_RELEASE_VERSION - Override engine release version",
            "FERROWIKI_PLUGINS_ENABLED - Enable or disable plugin execution (true/false)",
            "FERROWIKI_MODULES_ALLOW_INCOMPATIBLE - Admit version-incompatible modules (true/false)",
            "FERROWIKI_PAGE_SAVE_APPROVER - Principal approving page saves (empty disables)",
            "FERROWIKI_PROFILE_SAVE_APPROVER - Principal approving profile saves (empty disables)",
        ]
    }
}
