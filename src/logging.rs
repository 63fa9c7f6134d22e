// ==========================================
// Class Generation Engine - Logging setup
// ==========================================
// tracing + tracing-subscriber; level comes from RUST_LOG
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Env var that switches output to JSON lines.
pub const LOG_FORMAT_ENV: &str = "CLASS_GENERATION_LOG_FORMAT";

/// Installs the global subscriber.
///
/// # Environment
/// - RUST_LOG: filter directives (default: info),
///   e.g. `RUST_LOG=class_generation=debug`
/// - CLASS_GENERATION_LOG_FORMAT=json: structured output
///
/// ```no_run
/// use class_generation::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .init();
    }
}

/// Test subscriber: debug level, captured by the test harness.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
