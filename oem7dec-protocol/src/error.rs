//! Protocol error types.

use thiserror::Error;

/// Errors raised while parsing or building individual frames.
///
/// All of these are local to one frame: the framer answers them by
/// discarding bytes and rescanning, never by aborting the stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid sync bytes: {0:02x?}")]
    InvalidSync([u8; 3]),

    #[error("binary header length {0} is shorter than the fixed fields")]
    HeaderTooShort(u8),

    #[error("encoding requires the standard 28-byte header, got {0}")]
    NonStandardHeader(u8),

    #[error("payload length mismatch: header declares {declared}, got {actual}")]
    PayloadLengthMismatch { declared: usize, actual: usize },

    #[error("malformed ascii frame: {0}")]
    MalformedAscii(&'static str),
}
