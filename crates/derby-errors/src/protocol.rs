//! Serial command protocol errors.

use crate::config::ConfigError;

/// Reply written on the serial link for every rejected command.
pub const REJECT_REPLY: &str = "?";

/// A command line could not be parsed or could not be executed.
///
/// Every variant is reported to the operator as [`REJECT_REPLY`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Blank command line
    #[error("empty command line")]
    Empty,

    /// First character does not name a command
    #[error("unknown command '{0}'")]
    UnknownCommand(char),

    /// Command requires a selector character but none was given
    #[error("command '{0}' requires a selector")]
    MissingSelector(char),

    /// Selector character not understood by the command
    #[error("unknown selector '{selector}' for command '{command}'")]
    UnknownSelector {
        /// Command letter
        command: char,
        /// Offending selector
        selector: char,
    },

    /// Argument text is malformed
    #[error("invalid argument '{argument}' for {command}")]
    InvalidArgument {
        /// Command mnemonic, e.g. `OD`
        command: &'static str,
        /// The raw argument text
        argument: String,
    },

    /// Line exceeded the receive buffer and was discarded
    #[error("command line longer than {max} bytes")]
    LineTooLong {
        /// Receive buffer size
        max: usize,
    },

    /// Command is not accepted in the current race state
    #[error("{command} is not available while {state}")]
    NotAvailable {
        /// Command mnemonic
        command: &'static str,
        /// Current race state
        state: &'static str,
    },

    /// Argument parsed but the configuration rejected it
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProtocolError {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(command: &'static str, argument: impl Into<String>) -> Self {
        Self::InvalidArgument {
            command,
            argument: argument.into(),
        }
    }

    /// The line written back to the operator.
    #[must_use]
    pub fn reply(&self) -> &'static str {
        REJECT_REPLY
    }
}

/// Result type for protocol handling.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_replies_question_mark() {
        let errors = [
            ProtocolError::Empty,
            ProtocolError::UnknownCommand('Z'),
            ProtocolError::MissingSelector('O'),
            ProtocolError::UnknownSelector {
                command: 'O',
                selector: 'X',
            },
            ProtocolError::invalid_argument("OD", "x"),
            ProtocolError::LineTooLong { max: 48 },
            ProtocolError::NotAvailable {
                command: "RT",
                state: "racing",
            },
            ConfigError::out_of_range("decimal_places", 2u8, 3u8, 5u8).into(),
        ];
        for err in errors {
            assert_eq!(err.reply(), "?");
        }
    }

    #[test]
    fn test_config_error_is_transparent() {
        let inner = ConfigError::out_of_range("lane_count", 0u8, 1u8, 8u8);
        let err = ProtocolError::from(inner);
        assert_eq!(err.to_string(), inner.to_string());
    }
}
