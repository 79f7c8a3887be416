//! Logging initialization for the command line tools.
//!
//! Library code only emits `tracing` events; the binaries decide whether
//! and where they are written.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber, writing to stderr.
///
/// # Arguments
/// * `verbosity` - 0 = `RUST_LOG` or WARN, 1 = DEBUG, 2+ = TRACE
///
/// Calling this more than once keeps the first subscriber.
pub fn init(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::default().add_directive(LevelFilter::DEBUG.into()),
        _ => EnvFilter::default().add_directive(LevelFilter::TRACE.into()),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
