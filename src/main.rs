use clap::Parser;
use ferrowiki::cli::{self, Args};

fn main() -> ferrowiki::Result<()> {
    let args = Args::parse();
    ferrowiki::logging::init(args.verbose)?;
    cli::run(args)
}
