//! Tracing setup shared by both binaries

use eyre::Result;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber
///
/// `--verbose` drops the floor to DEBUG; `RUST_LOG` still wins for anything
/// it names. Kiosk processes log to stderr and let the service manager keep
/// the files.
pub fn setup(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}
