//! Tracing setup for programs embedding gomodscan.
//!
//! The library itself only emits `tracing` events: one `extract` span per
//! extraction, debug events for container and region decisions, trace
//! events for skipped symbols. A program that wants to see them installs a
//! subscriber, either its own or one of these.

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "gomodscan=info";

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs a global subscriber writing extraction spans and events.
///
/// Only the first call in a process has an effect. If the host program has
/// already installed a subscriber, that one stays.
pub fn init(format: LogFormat) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter());
        // Span close events carry the time spent in each extraction.
        let installed = match format {
            LogFormat::Text => registry
                .with(
                    fmt::layer()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_target(true),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_current_span(true),
                )
                .try_init(),
        };
        if installed.is_ok() {
            info!(?format, "gomodscan tracing initialized");
        }
    });
}

/// Installs a human-readable subscriber.
pub fn init_tracing() {
    init(LogFormat::Text);
}

/// Installs a JSON subscriber for structured log pipelines.
pub fn init_tracing_json() {
    init(LogFormat::Json);
}

/// Opens an `info` span around one extraction step.
#[macro_export]
macro_rules! span_trace {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Logs a fatal extraction error and yields it back for `map_err`.
#[macro_export]
macro_rules! log_error {
    ($err:expr) => {{
        let e = $err;
        tracing::error!(error = %e, fatal = e.is_fatal(), "Extraction failed");
        e
    }};
}
