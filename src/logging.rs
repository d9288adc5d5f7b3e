//! Installs the global tracing subscriber.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stderr at `level` and above.
///
/// A `RUST_LOG` environment variable, if set, replaces `level`. Calling this
/// more than once keeps the first subscriber.
pub fn setup_logging(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = tracing_subscriber::registry()
        .with(stderr_log.with_filter(filter))
        .try_init();

    if let Err(error) = result {
        tracing::debug!("Logging is already set up: {error}");
    }
}
