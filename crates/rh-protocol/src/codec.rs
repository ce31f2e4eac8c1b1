//! Tokio codec for newline-terminated protocol lines

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec};

use crate::error::ProtocolError;

/// Default upper bound on a single request or reply line
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Line codec with a length limit and protocol-level errors
///
/// Trailing `\r` is stripped, so HTTP request lines decode the same way as
/// bare protocol lines.
#[derive(Debug, Clone)]
pub struct LineCodec {
    inner: LinesCodec,
    max_length: usize,
}

impl LineCodec {
    /// Create a codec with the default maximum line length
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a codec that rejects lines longer than `max_length` bytes
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
            max_length,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.inner
            .decode(src)
            .map_err(|e| ProtocolError::from_lines(e, self.max_length))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.inner
            .decode_eof(src)
            .map_err(|e| ProtocolError::from_lines(e, self.max_length))
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner
            .encode(line, dst)
            .map_err(|e| ProtocolError::from_lines(e, self.max_length))
    }
}
