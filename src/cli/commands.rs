use crate::cli::args::{ConfigArgs, ManifestArgs, RenderArgs};
use crate::core::{
    ConfigLoader, MemoryPageProvider, MemoryProfileStore, ModuleManifest, RenderOutcome,
    WikiEngine,
};
use crate::core::modules::ModuleDescriptor;
use crate::core::types::ModuleKind;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn render(args: RenderArgs) -> crate::Result<()> {
    let workspace = workspace_root(args.workspace);
    let mut config = ConfigLoader::load_from_workspace(&workspace)?;
    if args.no_plugins {
        config.plugins.enabled = false;
    }

    let manifest = match &args.manifest {
        Some(path) => ModuleManifest::load_from_file(path)?,
        None => builtin_manifest(),
    };

    let engine = WikiEngine::new(
        config,
        &manifest,
        Arc::new(MemoryPageProvider::new()),
        Arc::new(MemoryProfileStore::new()),
    )?;

    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    match engine.render_text(&args.page, &raw)? {
        RenderOutcome::Html(html) => println!("{}", html),
        RenderOutcome::Redirect(location) => println!("redirect: {}", location),
    }
    Ok(())
}

pub fn manifest(args: ManifestArgs) -> crate::Result<()> {
    let manifest = ModuleManifest::load_from_file(&args.file)?;
    println!(
        "{}: ok ({} filters, {} plugins)",
        args.file.display(),
        manifest.filters().count(),
        manifest.plugins().count()
    );
    Ok(())
}

pub fn config(args: ConfigArgs) -> crate::Result<()> {
    let workspace = workspace_root(args.path);
    let config = ConfigLoader::load_from_workspace(&workspace)?;
    let rendered = toml::to_string_pretty(&config)
        .context("failed to serialize effective configuration")?;
    println!("{}", rendered);
    println!("# Environment overrides:");
    for line in ConfigLoader::env_var_documentation() {
        println!("#   {}", line);
    }
    Ok(())
}

fn workspace_root(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| Path::new(".").to_path_buf())
}

/// Manifest covering exactly the builtin modules, used when the caller
/// supplies none.
fn builtin_manifest() -> ModuleManifest {
    ModuleManifest {
        version: "1".to_string(),
        modules: vec![
            ModuleDescriptor::new("ProfanityFilter", ModuleKind::Filter),
            ModuleDescriptor::new("Echo", ModuleKind::Plugin),
            ModuleDescriptor::new("Counter", ModuleKind::Plugin),
            ModuleDescriptor::new("TableOfContents", ModuleKind::Plugin),
        ],
    }
}
