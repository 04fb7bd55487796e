//! Server error types.

use specmech_core::ConfigError;

/// Errors that can occur in the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_transport_errors() {
        let err: ServerError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();

        assert!(matches!(err, ServerError::Transport(_)));
        assert!(err.to_string().starts_with("transport error"));
    }

    #[test]
    fn config_errors_keep_their_message() {
        let err: ServerError = ConfigError::InvertedLimits { min: 5, max: 1 }.into();

        assert_eq!(err.to_string(), "configuration error: piston limits inverted: min 5 > max 1");
    }
}
