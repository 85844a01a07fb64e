#![allow(clippy::result_large_err)]

use super::{error_fragment, EngineInfo, PluginParameters, WikiPlugin};
use crate::core::context::RenderContext;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Registration record for one plugin: the instance plus its declared
/// capabilities from the manifest.
pub struct PluginRegistration {
    pub plugin: Arc<dyn WikiPlugin>,
    pub aliases: Vec<String>,
    /// Plugin declares a one-time initializer.
    pub has_initializer: bool,
    /// Run the initializer at registry build time instead of first use.
    pub eager_init: bool,
}

impl PluginRegistration {
    pub fn new(plugin: Arc<dyn WikiPlugin>) -> Self {
        Self {
            plugin,
            aliases: Vec::new(),
            has_initializer: false,
            eager_init: false,
        }
    }

    pub fn with_alias<T: Into<String>>(mut self, alias: T) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_initializer(mut self) -> Self {
        self.has_initializer = true;
        self
    }

    pub fn with_eager_init(mut self) -> Self {
        self.has_initializer = true;
        self.eager_init = true;
        self
    }
}

struct PluginEntry {
    plugin: Arc<dyn WikiPlugin>,
    has_initializer: bool,
    /// Initialization happens at most once per process; concurrent first
    /// users block until the winner finishes. A failed initialization is
    /// sticky and reported on every subsequent invocation.
    init_result: OnceLock<Result<(), String>>,
}

impl PluginEntry {
    fn ensure_initialized(&self, engine: &EngineInfo) -> Result<(), AppError> {
        if !self.has_initializer {
            return Ok(());
        }
        let result = self.init_result.get_or_init(|| {
            debug!(plugin = self.plugin.name(), "running one-time plugin initializer");
            self.plugin.initialize(engine).map_err(|err| err.to_string())
        });
        result.clone().map_err(|message| {
            AppError::new(
                ErrorCategory::PluginError,
                format!("plugin {} failed to initialize: {}", self.plugin.name(), message),
            )
            .with_code("PLG-INIT-001")
        })
    }
}

/// Builder used to register plugins before the engine starts.
pub struct PluginRegistryBuilder {
    engine: EngineInfo,
    entries: Vec<Arc<PluginEntry>>,
    names: HashMap<String, usize>,
    eager: Vec<usize>,
}

impl PluginRegistryBuilder {
    pub fn new(engine: EngineInfo) -> Self {
        Self {
            engine,
            entries: Vec::new(),
            names: HashMap::new(),
            eager: Vec::new(),
        }
    }

    pub fn register(&mut self, registration: PluginRegistration) -> Result<&mut Self, AppError> {
        let index = self.entries.len();
        let canonical = registration.plugin.name().to_string();
        self.bind_name(&canonical, index)?;
        for alias in &registration.aliases {
            self.bind_name(alias, index)?;
        }
        if registration.eager_init {
            self.eager.push(index);
        }
        self.entries.push(Arc::new(PluginEntry {
            plugin: registration.plugin,
            has_initializer: registration.has_initializer,
            init_result: OnceLock::new(),
        }));
        Ok(self)
    }

    fn bind_name(&mut self, name: &str, index: usize) -> Result<(), AppError> {
        let key = name.to_lowercase();
        if self.names.contains_key(&key) {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!("duplicate plugin name or alias: {}", name),
            )
            .with_code("PLG-REG-001"));
        }
        self.names.insert(key, index);
        Ok(())
    }

    /// Finalize the registry, running eagerly-declared initializers now.
    pub fn build(self) -> Result<PluginRegistry, AppError> {
        let registry = PluginRegistry {
            engine: Arc::new(self.engine),
            entries: self.entries.into(),
            names: Arc::new(self.names),
        };
        for index in self.eager {
            registry.entries[index].ensure_initialized(&registry.engine)?;
        }
        Ok(registry)
    }
}

/// Immutable, case-insensitive plugin registry shared by all request threads.
#[derive(Clone)]
pub struct PluginRegistry {
    engine: Arc<EngineInfo>,
    entries: Arc<[Arc<PluginEntry>]>,
    names: Arc<HashMap<String, usize>>,
}

impl PluginRegistry {
    pub fn builder(engine: EngineInfo) -> PluginRegistryBuilder {
        PluginRegistryBuilder::new(engine)
    }

    /// Empty registry for installations without plugins.
    pub fn empty(engine: EngineInfo) -> Self {
        PluginRegistryBuilder::new(engine)
            .build()
            .expect("empty registry has no eager initializers")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a plugin by name or alias, case-insensitively.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn WikiPlugin>, AppError> {
        self.lookup(name).map(|entry| Arc::clone(&entry.plugin))
    }

    fn lookup(&self, name: &str) -> Result<&Arc<PluginEntry>, AppError> {
        self.names
            .get(&name.to_lowercase())
            .map(|&index| &self.entries[index])
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::UnknownPluginError,
                    format!("unknown plugin: {}", name),
                )
                .with_code("PLG-RES-001")
            })
    }

    /// Resolve and execute a plugin; lazily runs its initializer on first
    /// use. Failures and unknown names become inline error fragments so a
    /// single plugin never aborts page rendering.
    pub fn invoke(&self, name: &str, ctx: &mut RenderContext, params: &PluginParameters) -> String {
        match self.try_invoke(name, ctx, params) {
            Ok(fragment) => fragment,
            Err(err) => error_fragment(name, &err.message),
        }
    }

    /// Like `invoke`, but surfaces the error to the caller instead of
    /// rendering it inline.
    pub fn try_invoke(
        &self,
        name: &str,
        ctx: &mut RenderContext,
        params: &PluginParameters,
    ) -> Result<String, AppError> {
        let entry = self.lookup(name)?;
        entry.ensure_initialized(&self.engine)?;
        entry.plugin.execute(ctx, params).map_err(|mut err| {
            err.add_context("plugin", entry.plugin.name());
            err
        })
    }
}
