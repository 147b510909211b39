//! Top-level error type and classification.

use core::fmt;

use crate::{ConfigError, ProtocolError};

/// Top-level error type that can wrap every derby timer sub-error.
#[derive(Debug, thiserror::Error)]
pub enum DerbyError {
    /// Rejected configuration change
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected serial command
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O errors on the host side (serial transport, config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl DerbyError {
    /// Get the error category for classification.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            DerbyError::Config(_) => ErrorCategory::Config,
            DerbyError::Protocol(ProtocolError::Config(_)) => ErrorCategory::Config,
            DerbyError::Protocol(_) => ErrorCategory::Protocol,
            DerbyError::Io(_) => ErrorCategory::Io,
            DerbyError::Other(_) => ErrorCategory::Other,
        }
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        DerbyError::Other(msg.into())
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Configuration validation
    Config = 0,
    /// Command parsing and admission
    Protocol = 1,
    /// Host I/O
    Io = 2,
    /// Anything else
    Other = 255,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Protocol => write!(f, "Protocol"),
            ErrorCategory::Io => write!(f, "IO"),
            ErrorCategory::Other => write!(f, "Other"),
        }
    }
}
