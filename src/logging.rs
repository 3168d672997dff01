use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Starts logging to stderr. `RUST_LOG` takes precedence over `base_level`.
///
/// The returned handle must be kept alive for as long as logging is needed.
pub fn setup_logging(base_level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(base_level)?
        .log_to_stderr()
        .start()
}
