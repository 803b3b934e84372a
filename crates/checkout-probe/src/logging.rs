//! Tracing subscriber setup for test binaries.

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Output format of the subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Filter directive for a verbosity level. `RUST_LOG` takes precedence.
#[must_use]
pub const fn filter_for(verbosity: u8) -> &'static str {
    // 0 = warnings only
    // 1 (-v) = info for the probe
    // 2+ (-vv) = per-candidate debug output
    match verbosity {
        0 => "warn",
        1 => "warn,checkout_probe=info",
        _ => "debug",
    }
}

/// Install a global subscriber writing compact lines to stderr.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(verbosity: u8) -> bool {
    init_logging_with(verbosity, LogFormat::Compact)
}

/// Install a global subscriber with the given format
pub fn init_logging_with(verbosity: u8, format: LogFormat) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity)));
    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(true)
        .with_level(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
