#![allow(clippy::result_large_err)]

use super::{ModuleDescriptor, ModuleManifest};
use crate::core::error::AppError;
use crate::core::filters::{FilterChain, FilterChainBuilder, PageFilter};
use crate::core::plugins::{EngineInfo, PluginRegistration, PluginRegistry, PluginRegistryBuilder};
use crate::core::types::ErrorCategory;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Produces a fresh, uninitialized filter instance for one manifest entry.
pub type FilterFactory = Box<dyn Fn() -> Box<dyn PageFilter> + Send + Sync>;

/// Produces the registration record for one manifest entry. The factory
/// declares intrinsic capabilities (initializer); aliases and eager-init
/// come from the manifest.
pub type PluginFactory = Box<dyn Fn() -> PluginRegistration + Send + Sync>;

/// Turns a validated module manifest into the runtime filter chain and
/// plugin registry.
///
/// Factories are bound by module name ahead of time; the manifest then picks
/// which to instantiate and in what order. Modules whose declared version
/// range excludes the running engine are skipped with a warning unless the
/// installation opts into admitting them.
pub struct ModuleRegistrar {
    engine: EngineInfo,
    engine_version: Vec<u64>,
    allow_incompatible: bool,
    filter_factories: HashMap<String, FilterFactory>,
    plugin_factories: HashMap<String, PluginFactory>,
}

impl ModuleRegistrar {
    pub fn new(engine: EngineInfo, allow_incompatible: bool) -> Result<Self, AppError> {
        let engine_version = super::parse_version(&engine.release_version).ok_or_else(|| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!(
                    "engine release version '{}' is not a dotted numeric version",
                    engine.release_version
                ),
            )
        })?;
        Ok(Self {
            engine,
            engine_version,
            allow_incompatible,
            filter_factories: HashMap::new(),
            plugin_factories: HashMap::new(),
        })
    }

    /// A registrar pre-loaded with every builtin filter and plugin.
    pub fn with_builtins(engine: EngineInfo, allow_incompatible: bool) -> Result<Self, AppError> {
        use crate::core::filters::builtin::ProfanityFilter;
        use crate::core::plugins::builtin::{CounterPlugin, EchoPlugin, TableOfContentsPlugin};

        let mut registrar = Self::new(engine, allow_incompatible)?;
        registrar.register_filter_factory("ProfanityFilter", || {
            Box::new(ProfanityFilter::default())
        });
        registrar.register_plugin_factory("Echo", || {
            PluginRegistration::new(Arc::new(EchoPlugin))
        });
        registrar.register_plugin_factory("Counter", || {
            PluginRegistration::new(Arc::new(CounterPlugin))
        });
        registrar.register_plugin_factory("TableOfContents", || {
            PluginRegistration::new(Arc::new(TableOfContentsPlugin)).with_initializer()
        });
        Ok(registrar)
    }

    pub fn register_filter_factory<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn PageFilter> + Send + Sync + 'static,
    {
        self.filter_factories
            .insert(name.to_lowercase(), Box::new(factory));
        self
    }

    pub fn register_plugin_factory<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> PluginRegistration + Send + Sync + 'static,
    {
        self.plugin_factories
            .insert(name.to_lowercase(), Box::new(factory));
        self
    }

    /// Instantiate every admitted module in the manifest. Filters come back
    /// in manifest order with their properties applied; plugins land in the
    /// registry under their canonical names and manifest aliases.
    pub fn instantiate(
        &self,
        manifest: &ModuleManifest,
    ) -> Result<(FilterChain, PluginRegistry), AppError> {
        manifest.validate()?;

        let mut chain = FilterChainBuilder::new();
        for descriptor in manifest.filters() {
            if !self.admit(descriptor)? {
                continue;
            }
            let factory = self.filter_factories.get(&descriptor.name.to_lowercase());
            let factory = factory.ok_or_else(|| unknown_module(descriptor))?;
            let mut filter = factory();
            filter.initialize(&descriptor.properties).map_err(|mut err| {
                err.add_context("filter", &descriptor.name);
                err
            })?;
            info!(filter = filter.name(), "filter registered");
            chain.register(Arc::from(filter));
        }

        let mut registry = PluginRegistryBuilder::new(self.engine.clone());
        for descriptor in manifest.plugins() {
            if !self.admit(descriptor)? {
                continue;
            }
            let factory = self.plugin_factories.get(&descriptor.name.to_lowercase());
            let factory = factory.ok_or_else(|| unknown_module(descriptor))?;
            let mut registration = factory();
            for alias in &descriptor.aliases {
                registration = registration.with_alias(alias.clone());
            }
            if descriptor.eager_init {
                registration = registration.with_eager_init();
            }
            info!(plugin = registration.plugin.name(), "plugin registered");
            registry.register(registration)?;
        }

        Ok((chain.build(), registry.build()?))
    }

    /// Whether a module's version range admits the running engine. Skipped
    /// modules log a warning; `allow_incompatible` turns the skip into an
    /// admission.
    fn admit(&self, descriptor: &ModuleDescriptor) -> Result<bool, AppError> {
        match descriptor.check_compatibility(&self.engine_version) {
            Ok(()) => Ok(true),
            Err(err) if err.category == ErrorCategory::ModuleCompatibilityError => {
                if self.allow_incompatible {
                    warn!(
                        module = descriptor.name.as_str(),
                        "admitting version-incompatible module per configuration"
                    );
                    Ok(true)
                } else {
                    warn!(
                        module = descriptor.name.as_str(),
                        error = %err,
                        "skipping version-incompatible module"
                    );
                    Ok(false)
                }
            }
            Err(err) => Err(err),
        }
    }
}

fn unknown_module(descriptor: &ModuleDescriptor) -> AppError {
    AppError::new(
        ErrorCategory::ValidationError,
        format!(
            "manifest names module {} but no factory is registered for it",
            descriptor.name
        ),
    )
    .with_code("MOD-REG-001")
}
