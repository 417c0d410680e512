//! Logging and tracing infrastructure for heapscope.
//!
//! Structured logging through the tracing crate, with plain or JSON output
//! and `RUST_LOG` style filtering.

use serde::{Deserialize, Serialize};
use std::sync::Once;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "info";

/// Logging settings carried in [`crate::config::InspectorConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn install(fallback: &str, json: bool) {
    INIT.call_once(|| {
        let filter = env_filter(fallback);

        // try_init: a host program may already own the global subscriber.
        let result = if json {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_current_span(true);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        } else {
            let layer = fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        };

        match result {
            Ok(()) => info!(json, "heapscope tracing initialized"),
            Err(err) => debug!(error = %err, "Tracing subscriber already installed"),
        }
    });
}

/// Initialize the global tracing subscriber.
///
/// This should be called once at program startup.
/// Subsequent calls are ignored.
pub fn init_tracing() {
    install(DEFAULT_FILTER, false);
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json() {
    install(DEFAULT_FILTER, true);
}

/// Initialize tracing from configuration.
pub fn init_with(config: &LoggingConfig) {
    install(&config.filter, config.json);
}

/// Macro for creating spans around inspection steps
#[macro_export]
macro_rules! span_trace {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
