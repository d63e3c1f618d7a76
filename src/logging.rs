use crate::error::{AnalyzerError, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initializes the application's logging system with the specified log level
///
/// Output goes to stderr.
/// `RUST_LOG` takes precedence when set. Valid log levels are: error, warn, info, debug, trace
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_log_level(log_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| AnalyzerError::Internal(format!("Failed to initialize logging: {}", e)))
}

/// Parses a log level string into a LevelFilter
///
/// Returns the corresponding LevelFilter, defaulting to Info for invalid strings
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}
