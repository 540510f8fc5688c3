use super::{Level, LogConfig, LogError, Logger};
use std::sync::{LazyLock, OnceLock};

static LOGGER: OnceLock<Logger> = OnceLock::new();
static LAZY: LazyLock<Logger> = LazyLock::new(|| Logger::new(Level::Debug));

/// Builds the process-wide logger and makes its file sink the global tracing
/// default, so plain `tracing` events land in the same rotating file.
///
/// Succeeds even after `log()` handed out the lazy fallback; later `log()`
/// calls return the configured logger.
pub fn init(config: &LogConfig) -> Result<&'static Logger, LogError> {
    if LOGGER.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let logger = Logger::build(config)?;
    LOGGER
        .set(logger)
        .map_err(|_| LogError::AlreadyInitialized)?;
    let logger = LOGGER.get().ok_or(LogError::AlreadyInitialized)?;
    if let Some(dispatch) = logger.dispatch() {
        tracing::dispatcher::set_global_default(dispatch.clone())
            .map_err(|e| LogError::Subscriber(e.to_string()))?;
    }
    Ok(logger)
}

/// Returns the process-wide logger, or a console-only `Debug` logger while
/// `init` has not been called.
pub fn log() -> &'static Logger {
    LOGGER.get().unwrap_or_else(|| &*LAZY)
}
