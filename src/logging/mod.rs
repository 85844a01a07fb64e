use anyhow::anyhow;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the logging framework for the current process.
///
/// The filter defaults to `ferrowiki=info` (or `debug` with `verbose`) and
/// can be overridden through the `FERROWIKI_LOG` environment variable.
/// Errors when invoked more than once per process.
pub fn init(verbose: bool) -> crate::Result<()> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("FERROWIKI_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("ferrowiki={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install logging subscriber: {}", err))?;
    Ok(())
}
