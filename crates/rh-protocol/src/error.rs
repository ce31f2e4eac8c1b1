//! Protocol error types

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors that can occur while reading or interpreting protocol lines
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A required token never appeared
    #[error("Missing [{0}=] token")]
    MissingToken(&'static str),

    /// A token was present but its value is not a valid number
    #[error("Invalid value for [{key}=]: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    /// A `[key=` token with no closing bracket
    #[error("Unterminated [{0}=] token")]
    Unterminated(&'static str),

    /// Line exceeded the configured maximum length
    #[error("Line exceeds maximum length of {max} bytes")]
    LineTooLong { max: usize },

    /// Line bytes are not valid UTF-8
    #[error("Line is not valid UTF-8")]
    InvalidEncoding,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    pub(crate) fn from_lines(err: LinesCodecError, max: usize) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => ProtocolError::LineTooLong { max },
            // LinesCodec reports undecodable bytes as InvalidData
            LinesCodecError::Io(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                ProtocolError::InvalidEncoding
            }
            LinesCodecError::Io(e) => ProtocolError::Io(e),
        }
    }

    /// The peer sent a line we could read but not accept.
    ///
    /// Such a line deserves an "invalid request" reply; any other error
    /// means the socket itself failed.
    pub fn is_malformed_line(&self) -> bool {
        matches!(
            self,
            ProtocolError::LineTooLong { .. } | ProtocolError::InvalidEncoding
        )
    }
}
