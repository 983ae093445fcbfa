//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use herald_framework::CommandError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Building the dispatcher failed, or a dispatch error escaped the
    /// error handler.
    #[error(transparent)]
    Dispatch(#[from] CommandError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_convert_transparently() {
        let config: RuntimeError = ConfigError::missing_field("bot.prefix").into();
        assert!(matches!(config, RuntimeError::Config(_)));
        assert_eq!(
            config.to_string(),
            "Missing required configuration field: bot.prefix"
        );

        let dispatch: RuntimeError = CommandError::InvalidPrefix {
            prefix: String::new(),
        }
        .into();
        assert!(matches!(dispatch, RuntimeError::Dispatch(_)));
    }
}
