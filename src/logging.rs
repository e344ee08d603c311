//! Logging setup and event macros.
//!
//! Output is compact and timestamped, with per-target levels from config.
//! `RUST_LOG` overrides everything.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"     # quiet by default
//!
//! [logging.modules]
//! devscan = "info"     # discoveries and registry changes
//! ```
//!
//! # Environment Variable
//!
//! ```bash
//! RUST_LOG=debug devscan watch ~/code
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string from config.
///
/// `level_override` replaces the configured default (used by `--verbose`).
pub fn filter_directives(config: &LoggingConfig, level_override: Option<&str>) -> String {
    let mut directives = level_override.unwrap_or(&config.default).to_string();
    for (module, level) in &config.modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

/// Initialize logging. Only the first call in a process takes effect.
///
/// Logs go to stderr so that `--json` output on stdout stays parseable.
pub fn init_with_config(config: &LoggingConfig, level_override: Option<&str>) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config, level_override))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Log an event with component context at info level.
///
/// # Examples
/// ```ignore
/// log_event!("watcher", "project added", "{}", path.display());
/// log_event!("scan", "complete");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Same as [`log_event!`] at debug level.
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
