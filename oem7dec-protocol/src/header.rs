//! Fixed headers for the two binary formats.
//!
//! Binary frame layout (28-byte header, little-endian):
//!
//! ```text
//! +------+------+------+--------+--------+------+------+--------+
//! | AA   | 44   | 12   | hdr_len| msg_id | type | port | msg_len|
//! | 1    | 1    | 1    | 1      | 2      | 1    | 1    | 2      |
//! +------+------+------+--------+--------+------+------+--------+
//! | seq  | idle | tstat| week   | millis | rx_status | rsvd | sw|
//! | 2    | 1    | 1    | 2      | 4      | 4         | 2    | 2 |
//! +------+------+------+--------+--------+-----------+------+---+
//! | payload (msg_len bytes) | crc32 (4 bytes)                  |
//! +-------------------------+----------------------------------+
//! ```
//!
//! Short binary frames carry a compact 12-byte header: sync `AA 44 13`,
//! one-byte payload length, message id, week, milliseconds.
//!
//! The CRC covers every byte from the first sync byte through the end of
//! the payload.

use crate::error::ProtocolError;
use crate::message::MessageType;
use crate::{BINARY_HEADER_LEN, BINARY_SYNC, CRC_LEN, SHORT_BINARY_SYNC, SHORT_HEADER_LEN};
use bytes::{BufMut, BytesMut};

/// Response bit in the binary header's message type field.
const RESPONSE_BIT: u8 = 0x80;

/// Parsed binary (long format) header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    /// Declared header length; payload begins at this offset. Usually 28,
    /// larger for extended-header firmware.
    pub header_length: u8,
    pub message_id: u16,
    /// Raw message type field: b0-4 measurement source, b5-6 format,
    /// b7 response bit.
    pub message_type: u8,
    pub port_address: u8,
    /// Declared payload length, excluding header and CRC.
    pub payload_length: u16,
    pub sequence: u16,
    pub idle_time: u8,
    pub time_status: u8,
    pub week: u16,
    pub milliseconds: i32,
    pub receiver_status: u32,
    pub reserved: u16,
    pub sw_version: u16,
}

impl BinaryHeader {
    /// Creates a header for encoding, with the standard length and zeroed
    /// receiver fields.
    pub fn new(message_id: u16, payload_length: u16) -> Self {
        Self {
            header_length: BINARY_HEADER_LEN as u8,
            message_id,
            message_type: 0,
            port_address: 0,
            payload_length,
            sequence: 0,
            idle_time: 0,
            time_status: 0,
            week: 0,
            milliseconds: 0,
            receiver_status: 0,
            reserved: 0,
            sw_version: 0,
        }
    }

    /// Marks the frame as a command response.
    pub fn with_response(mut self) -> Self {
        self.message_type |= RESPONSE_BIT;
        self
    }

    /// Sets the GPS reference time fields.
    pub fn with_time(mut self, week: u16, milliseconds: i32) -> Self {
        self.week = week;
        self.milliseconds = milliseconds;
        self
    }

    pub fn with_sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence;
        self
    }

    /// Decodes a header from the start of `buf` (which must begin at the
    /// sync bytes).
    ///
    /// Returns `Ok(None)` if fewer than 28 bytes are available yet.
    pub fn decode(buf: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < BINARY_HEADER_LEN {
            return Ok(None);
        }
        if buf[0..3] != BINARY_SYNC {
            return Err(ProtocolError::InvalidSync([buf[0], buf[1], buf[2]]));
        }

        let header_length = buf[3];
        if (header_length as usize) < BINARY_HEADER_LEN {
            return Err(ProtocolError::HeaderTooShort(header_length));
        }

        Ok(Some(Self {
            header_length,
            message_id: u16::from_le_bytes([buf[4], buf[5]]),
            message_type: buf[6],
            port_address: buf[7],
            payload_length: u16::from_le_bytes([buf[8], buf[9]]),
            sequence: u16::from_le_bytes([buf[10], buf[11]]),
            idle_time: buf[12],
            time_status: buf[13],
            week: u16::from_le_bytes([buf[14], buf[15]]),
            milliseconds: i32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
            receiver_status: u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]),
            reserved: u16::from_le_bytes([buf[24], buf[25]]),
            sw_version: u16::from_le_bytes([buf[26], buf[27]]),
        }))
    }

    /// Total frame size: header, payload, and trailing CRC.
    pub fn frame_len(&self) -> usize {
        self.header_length as usize + self.payload_length as usize + CRC_LEN
    }

    /// Log or response, from the response bit.
    pub fn kind(&self) -> MessageType {
        if self.message_type & RESPONSE_BIT != 0 {
            MessageType::Response
        } else {
            MessageType::Log
        }
    }

    pub(crate) fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_slice(&BINARY_SYNC);
        buf.put_u8(self.header_length);
        buf.put_u16_le(self.message_id);
        buf.put_u8(self.message_type);
        buf.put_u8(self.port_address);
        buf.put_u16_le(self.payload_length);
        buf.put_u16_le(self.sequence);
        buf.put_u8(self.idle_time);
        buf.put_u8(self.time_status);
        buf.put_u16_le(self.week);
        buf.put_i32_le(self.milliseconds);
        buf.put_u32_le(self.receiver_status);
        buf.put_u16_le(self.reserved);
        buf.put_u16_le(self.sw_version);
    }
}

/// Parsed short binary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortHeader {
    /// Declared payload length, excluding header and CRC.
    pub payload_length: u8,
    pub message_id: u16,
    pub week: u16,
    pub milliseconds: i32,
}

impl ShortHeader {
    pub fn new(message_id: u16, payload_length: u8, week: u16, milliseconds: i32) -> Self {
        Self {
            payload_length,
            message_id,
            week,
            milliseconds,
        }
    }

    /// Decodes a short header from the start of `buf`.
    ///
    /// Returns `Ok(None)` if fewer than 12 bytes are available yet.
    pub fn decode(buf: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < SHORT_HEADER_LEN {
            return Ok(None);
        }
        if buf[0..3] != SHORT_BINARY_SYNC {
            return Err(ProtocolError::InvalidSync([buf[0], buf[1], buf[2]]));
        }

        Ok(Some(Self {
            payload_length: buf[3],
            message_id: u16::from_le_bytes([buf[4], buf[5]]),
            week: u16::from_le_bytes([buf[6], buf[7]]),
            milliseconds: i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        }))
    }

    /// Total frame size: header, payload, and trailing CRC.
    pub fn frame_len(&self) -> usize {
        SHORT_HEADER_LEN + self.payload_length as usize + CRC_LEN
    }

    pub(crate) fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_slice(&SHORT_BINARY_SYNC);
        buf.put_u8(self.payload_length);
        buf.put_u16_le(self.message_id);
        buf.put_u16_le(self.week);
        buf.put_i32_le(self.milliseconds);
    }
}
