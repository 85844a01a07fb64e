use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Markup file to render
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Page name used for section anchors and plugin context
    #[arg(long, default_value = "Main", value_name = "NAME")]
    pub page: String,

    /// Workspace root containing ferrowiki.toml (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Module manifest to load (default: builtin modules only)
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Render plugin tags as literal text
    #[arg(long)]
    pub no_plugins: bool,
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Module manifest file to validate
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Workspace root containing ferrowiki.toml (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}
