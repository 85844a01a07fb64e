pub mod args;
pub mod commands;

pub use args::{ConfigArgs, ManifestArgs, RenderArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "ferrowiki")]
#[command(version = crate::VERSION)]
#[command(about = "Wiki page-processing pipeline: filters, plugins, markup rendering, and approval workflows")]
#[command(help_template = HELP_TEMPLATE)]
pub struct Args {
    /// Log at debug level instead of info
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Render a wiki markup file to HTML",
        long_about = "Render reads a markup file, runs it through the filter chain and plugin-aware parser, and prints the resulting HTML to stdout.",
        after_help = "Example:\n    ferrowiki render page.wiki --page Main"
    )]
    Render(RenderArgs),
    #[command(
        about = "Validate a module manifest",
        long_about = "Manifest parses a YAML module manifest and checks it against the schema rules: supported version, unique names, parseable version bounds, eager-init only on plugins.",
        after_help = "Example:\n    ferrowiki manifest modules.yaml"
    )]
    Manifest(ManifestArgs),
    #[command(
        about = "Show the effective engine configuration",
        long_about = "Config loads ferrowiki.toml from the workspace, applies environment overrides, and prints the effective configuration plus the recognized environment variables.",
        after_help = "Example:\n    ferrowiki config ."
    )]
    Config(ConfigArgs),
}

pub fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Render(render_args) => commands::render(render_args),
        Command::Manifest(manifest_args) => commands::manifest(manifest_args),
        Command::Config(config_args) => commands::config(config_args),
    }
}
