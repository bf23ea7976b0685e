//! Logging initialization.
//!
//! Thin wrapper over the `observability` package so binaries only pass a
//! service name and level.

/// Initialize the logging system for a pathway binary.
///
/// Log level comes from `RUST_LOG` when set, otherwise from `level`.
/// Structured JSONL goes to `~/.hajj-pathway/logs/dev.jsonl`; `also_stderr`
/// mirrors it to the terminal in compact form.
pub fn init_logging(service_name: &str, level: &str, also_stderr: bool) {
    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).to_string().to_ascii_lowercase(),
        also_stderr,
        ..Default::default()
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
