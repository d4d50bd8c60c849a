use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::infra::{config::LogConfig, error::AppError};

/// Installs the global subscriber. Logs go to stderr; stdout belongs to the
/// console views.
pub fn init(config: &LogConfig) -> Result<(), AppError> {
    let stderr = std::io::stderr();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)),
        )
        .with_target(true)
        .with_ansi(stderr.is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(AppError::LoggingInit)
}
