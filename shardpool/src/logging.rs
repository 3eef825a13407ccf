//! Logging setup for the runtime, built on the `tracing` ecosystem.
//!
//! The library itself only emits `tracing` events and never installs a
//! subscriber; binaries and tests opt in through [`init`] or
//! [`init_default`]. `RUST_LOG` overrides the configured level when set.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

// Re-export the macros so callers can `use shardpool::logging` alone.
pub use tracing::{debug, error, info, trace, warn};

/// Configuration for the logging subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level to emit when `RUST_LOG` is not set.
    pub level: Level,
    /// Emit JSON lines instead of human-readable output.
    pub json_format: bool,
    /// Include file and line of the callsite.
    pub show_file_line: bool,
    /// Include the worker thread name.
    pub show_thread_names: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: false,
            show_thread_names: true,
        }
    }
}

static INIT: Once = Once::new();

/// Install the global subscriber. Safe to call more than once; only the
/// first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(config.level).into()));

        if config.json_format {
            let layer = fmt::layer()
                .json()
                .with_file(config.show_file_line)
                .with_line_number(config.show_file_line)
                .with_thread_names(config.show_thread_names);
            let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
        } else {
            let layer = fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stdout))
                .with_file(config.show_file_line)
                .with_line_number(config.show_file_line)
                .with_thread_names(config.show_thread_names);
            let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
        }
    });
}

/// Initialize with defaults: INFO level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}
