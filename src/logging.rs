//! Diagnostics setup.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },
}

/// Install a formatting subscriber filtered by `filter`, e.g. `"info"` or
/// `"hubble_stages=debug"`.
///
/// Returns `false` if a global subscriber was already installed, which makes
/// repeated calls from tests harmless.
pub fn init_logging(filter: &str) -> Result<bool, LoggingError> {
    let env_filter = EnvFilter::try_new(filter).map_err(|e| LoggingError::InvalidFilter {
        filter: filter.to_string(),
        message: e.to_string(),
    })?;

    Ok(tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let first = init_logging("hubble_stages=debug").unwrap();
        let second = init_logging("info").unwrap();
        assert!(!(first && second));
    }

    #[test]
    fn invalid_filter_is_reported() {
        assert!(matches!(
            init_logging("hubble_stages=loudest"),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }
}
