//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,stagelight=debug,wgpu=warn,naga=warn";

/// Install the global tracing subscriber.
///
/// Filtering comes from `RUST_LOG` when set, otherwise [`DEFAULT_FILTER`].
/// Calling this twice is harmless; the second call leaves the first subscriber
/// in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
