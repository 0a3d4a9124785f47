//! # oem7dec-protocol
//!
//! Wire protocol layer for the NovAtel OEM7 message family.
//!
//! This crate provides:
//! - Sync patterns and fixed header layouts for the binary and short binary
//!   formats
//! - Delimited-frame parsing for the ASCII and abbreviated ASCII formats
//! - The vendor CRC-32 used by every checksummed format
//! - `RawMessage`, the immutable decoded artifact handed to callers
//! - Frame encoders for producing well-formed frames
//!
//! Everything here is stateless; the streaming state machine that drives
//! these parsers over a byte source lives in `oem7dec-framer`.

pub mod ascii;
pub mod crc;
pub mod encode;
pub mod error;
pub mod header;
pub mod message;

pub use ascii::{AbbrevFrame, AsciiFrame};
pub use error::ProtocolError;
pub use header::{BinaryHeader, ShortHeader};
pub use message::{FrameHeader, GpsTime, MessageFormat, MessageType, RawMessage};

/// Sync pattern opening a binary frame.
pub const BINARY_SYNC: [u8; 3] = [0xAA, 0x44, 0x12];

/// Sync pattern opening a short binary frame.
pub const SHORT_BINARY_SYNC: [u8; 3] = [0xAA, 0x44, 0x13];

/// Leading character of an ASCII frame.
pub const ASCII_SYNC: u8 = b'#';

/// Leading character of an abbreviated ASCII frame.
pub const ABBREV_ASCII_SYNC: u8 = b'<';

/// Leading character of an interleaved NMEA sentence (foreign traffic).
pub const NMEA_SYNC: u8 = b'$';

/// Size of the fixed binary header in bytes.
pub const BINARY_HEADER_LEN: usize = 28;

/// Size of the short binary header in bytes.
pub const SHORT_HEADER_LEN: usize = 12;

/// Size of the trailing CRC on binary frames, in bytes.
pub const CRC_LEN: usize = 4;
