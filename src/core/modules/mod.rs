#![allow(clippy::result_large_err)] // Manifest APIs return AppError to preserve structured validation context without boxing.

use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, ModuleKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub mod registrar;
pub mod version;

pub use registrar::{FilterFactory, ModuleRegistrar, PluginFactory};
pub use version::{compare_versions, parse_version, VersionBounds};

const SUPPORTED_MANIFEST_VERSION: &str = "1";

fn default_properties() -> HashMap<String, String> {
    HashMap::new()
}

fn default_aliases() -> Vec<String> {
    Vec::new()
}

/// Root document for a module manifest.
///
/// The manifest enumerates the filters and plugins an installation loads at
/// startup; manifest order is pipeline order for filters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleManifest {
    pub version: String,
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
}

/// One filter or plugin declared in a manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub kind: ModuleKind,
    #[serde(default = "default_aliases")]
    pub aliases: Vec<String>,
    /// Minimum engine version (inclusive) this module supports.
    pub min_version: Option<String>,
    /// Maximum engine version (inclusive) this module supports.
    pub max_version: Option<String>,
    /// Run the plugin initializer eagerly at startup instead of on first use.
    #[serde(default)]
    pub eager_init: bool,
    #[serde(default = "default_properties")]
    pub properties: HashMap<String, String>,
}

impl ModuleDescriptor {
    pub fn new<T: Into<String>>(name: T, kind: ModuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            aliases: Vec::new(),
            min_version: None,
            max_version: None,
            eager_init: false,
            properties: HashMap::new(),
        }
    }

    pub fn with_alias<T: Into<String>>(mut self, alias: T) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_version_bounds(
        mut self,
        min: Option<&str>,
        max: Option<&str>,
    ) -> Self {
        self.min_version = min.map(str::to_string);
        self.max_version = max.map(str::to_string);
        self
    }

    pub fn with_property<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Parsed version bounds; fails when a declared bound is malformed.
    pub fn version_bounds(&self) -> Result<VersionBounds, AppError> {
        let min = match &self.min_version {
            Some(raw) => Some(parse_version(raw).ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ValidationError,
                    format!("module {} declares malformed min_version '{}'", self.name, raw),
                )
            })?),
            None => None,
        };
        let max = match &self.max_version {
            Some(raw) => Some(parse_version(raw).ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ValidationError,
                    format!("module {} declares malformed max_version '{}'", self.name, raw),
                )
            })?),
            None => None,
        };
        Ok(VersionBounds { min, max })
    }

    /// Check this module against the running engine version.
    pub fn check_compatibility(&self, engine_version: &[u64]) -> Result<(), AppError> {
        if self.version_bounds()?.accepts(engine_version) {
            return Ok(());
        }
        Err(AppError::new(
            ErrorCategory::ModuleCompatibilityError,
            format!(
                "module {} supports engine versions {}..{}, running engine is outside that range",
                self.name,
                self.min_version.as_deref().unwrap_or("*"),
                self.max_version.as_deref().unwrap_or("*"),
            ),
        )
        .with_code("MOD-VER-001"))
    }
}

impl ModuleManifest {
    /// Load and validate a module manifest from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|err| {
            AppError::new(
                ErrorCategory::IoError,
                format!("failed to read {}: {}", path.display(), err),
            )
        })?;
        Self::load_from_str(&text)
    }

    /// Parse and validate a manifest from YAML text.
    pub fn load_from_str(text: &str) -> Result<Self, AppError> {
        let manifest: ModuleManifest = serde_yaml::from_str(text).map_err(|err| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("failed to parse module manifest: {}", err),
            )
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest against schema requirements.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.version != SUPPORTED_MANIFEST_VERSION {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!(
                    "unsupported manifest version {}, expected {}",
                    self.version, SUPPORTED_MANIFEST_VERSION
                ),
            ));
        }

        let mut names = HashSet::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    "manifest contains a module with an empty name",
                ));
            }
            if !names.insert(module.name.to_lowercase()) {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    format!("duplicate module name: {}", module.name),
                ));
            }
            for alias in &module.aliases {
                if !names.insert(alias.to_lowercase()) {
                    return Err(AppError::new(
                        ErrorCategory::ValidationError,
                        format!("module alias {} collides with another name", alias),
                    ));
                }
            }
            // Bounds must parse even if the module is never admitted.
            module.version_bounds()?;
            if module.eager_init && module.kind != ModuleKind::Plugin {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    format!("module {} sets eager_init but is not a plugin", module.name),
                ));
            }
        }
        Ok(())
    }

    pub fn filters(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules
            .iter()
            .filter(|module| module.kind == ModuleKind::Filter)
    }

    pub fn plugins(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules
            .iter()
            .filter(|module| module.kind == ModuleKind::Plugin)
    }
}
