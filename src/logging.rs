use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::foundation::error::{AlbumError, AlbumResult};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber: human-readable lines on stderr, filtered by `RUST_LOG`.
///
/// `verbose` raises the crate's own level to `debug` on top of the environment filter.
pub fn init_logging(verbose: bool) -> AlbumResult<()> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if verbose {
        let directive = "eraframe=debug"
            .parse()
            .map_err(|e| AlbumError::config(format!("log directive: {e}")))?;
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| AlbumError::config(format!("install log subscriber: {e}")))
}
