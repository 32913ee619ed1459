//! Unified error system for Sprig
//!
//! Build-time failures, configuration problems and hook failures all travel
//! as a single flat error type. Request-time outcomes add one extra case on
//! top of it: the "not handled" control signal, which is not a failure.

use serde::{Deserialize, Serialize};

/// Unified error type for all Sprig operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SprigError {
    /// Invalid input or configuration value
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Configuration could not be loaded or merged
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration failure
        message: String,
    },

    /// A component initializer failed
    #[error("Init error: {message}")]
    Init {
        /// Error message describing the initialization failure
        message: String,
    },

    /// A post-init or reload hook failed
    #[error("Hook failed: {message}")]
    Hook {
        /// Message reported by the failing hook
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl SprigError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an initializer error
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init {
            message: message.into(),
        }
    }

    /// Create a hook failure error
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for Sprig operations
pub type Result<T> = std::result::Result<T, SprigError>;

impl From<std::io::Error> for SprigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SprigError {
    fn from(err: serde_json::Error) -> Self {
        Self::config(err.to_string())
    }
}

/// Failure reported by a [`Hook`](crate::Hook).
///
/// Carries the text the hook gave up with; displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Create a hook failure with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message the hook failed with
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<HookError> for SprigError {
    fn from(err: HookError) -> Self {
        Self::hook(err.message)
    }
}

/// Outcome of a request computation that did not produce a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The computation declined to process the current request.
    ///
    /// This is a control signal rather than a failure: it propagates until
    /// something else handles the request or the pipeline reports no match.
    #[error("request not handled")]
    NotHandled,

    /// The computation failed
    #[error(transparent)]
    Failed(#[from] SprigError),
}

impl HandlerError {
    /// Whether this is the not-handled signal
    pub fn is_not_handled(&self) -> bool {
        matches!(self, Self::NotHandled)
    }
}

/// Result type for request computations
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SprigError::config("missing key");
        assert!(matches!(err, SprigError::Config { .. }));
        assert_eq!(err.to_string(), "Config error: missing key");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SprigError::from(io_err);
        assert!(matches!(err, SprigError::NotFound { .. }));
    }

    #[test]
    fn test_hook_error_displays_verbatim() {
        let err = HookError::new("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(SprigError::from(err), SprigError::hook("boom"));
    }

    #[test]
    fn test_not_handled_is_not_a_failure() {
        assert!(HandlerError::NotHandled.is_not_handled());
        let failed: HandlerError = SprigError::internal("x").into();
        assert!(!failed.is_not_handled());
    }
}
