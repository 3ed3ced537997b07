//! Logging setup
//!
//! Wires up `tracing-subscriber` once at startup. `RUST_LOG` overrides the
//! config-driven level; sqlx statement logging is kept at warn so prompt
//! and turn contents never land in logs at info level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging at the given default level.
///
/// Safe to call more than once; later calls are no-ops. Debug builds get
/// pretty terminal output, release builds structured JSON.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},brandloom_engine={},sqlx=warn",
            log_level, log_level
        ))
    });

    #[cfg(debug_assertions)]
    let layer = fmt::layer().pretty().with_target(false).boxed();

    #[cfg(not(debug_assertions))]
    let layer = fmt::layer().json().with_current_span(true).boxed();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .ok();
}
