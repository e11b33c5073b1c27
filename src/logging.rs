use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{DEFAULT_LOG_FILTER, VERBOSE_LOG_FILTER};

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Stdout is kept clean for the fingerprint JSON.
pub fn init(verbose: bool) {
    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();

    // A subscriber may already be installed (tests, embedding); keep it.
    if let Err(e) = result {
        tracing::debug!("logging already initialized: {e}");
    }
}
