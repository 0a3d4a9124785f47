//! The decoded raw message and its metadata types.

use crate::header::{BinaryHeader, ShortHeader};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire format a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageFormat {
    Binary,
    ShortBinary,
    Ascii,
    AbbrevAscii,
    /// Recognized-but-foreign traffic (NMEA sentences), only emitted when
    /// the framer is configured to pass it through.
    Unknown,
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFormat::Binary => write!(f, "BINARY"),
            MessageFormat::ShortBinary => write!(f, "SHORT_BINARY"),
            MessageFormat::Ascii => write!(f, "ASCII"),
            MessageFormat::AbbrevAscii => write!(f, "ABBREV_ASCII"),
            MessageFormat::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Log (receiver output) or response (command acknowledgement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Log,
    Response,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Log => write!(f, "LOG"),
            MessageType::Response => write!(f, "RESPONSE"),
        }
    }
}

/// GPS reference time carried by the binary headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsTime {
    pub week: u16,
    pub milliseconds: i32,
}

/// Structured header retained on the message, when the format has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHeader {
    Binary(BinaryHeader),
    Short(ShortHeader),
    /// Text formats carry no fixed header worth retaining.
    Text,
}

/// One decoded message, handed to the caller by value.
///
/// The payload is an immutable, contiguous byte sequence owned by this
/// message; emitting it transfers ownership and the framer keeps no
/// reference to it.
#[derive(Debug, Clone)]
pub struct RawMessage {
    message_type: MessageType,
    message_format: MessageFormat,
    message_id: u16,
    payload: Bytes,
    header: FrameHeader,
}

impl RawMessage {
    /// Builds a message from a validated binary frame.
    pub fn binary(header: BinaryHeader, payload: Bytes) -> Self {
        Self {
            message_type: header.kind(),
            message_format: MessageFormat::Binary,
            message_id: header.message_id,
            payload,
            header: FrameHeader::Binary(header),
        }
    }

    /// Builds a message from a validated short binary frame.
    pub fn short(header: ShortHeader, payload: Bytes) -> Self {
        Self {
            message_type: MessageType::Log,
            message_format: MessageFormat::ShortBinary,
            message_id: header.message_id,
            payload,
            header: FrameHeader::Short(header),
        }
    }

    /// Builds a message from one of the text formats.
    pub fn text(
        message_format: MessageFormat,
        message_type: MessageType,
        message_id: u16,
        payload: Bytes,
    ) -> Self {
        Self {
            message_type,
            message_format,
            message_id,
            payload,
            header: FrameHeader::Text,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn message_format(&self) -> MessageFormat {
        self.message_format
    }

    pub fn message_id(&self) -> u16 {
        self.message_id
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// GPS reference time, for the formats that carry one.
    pub fn gps_time(&self) -> Option<GpsTime> {
        match &self.header {
            FrameHeader::Binary(h) => Some(GpsTime {
                week: h.week,
                milliseconds: h.milliseconds,
            }),
            FrameHeader::Short(h) => Some(GpsTime {
                week: h.week,
                milliseconds: h.milliseconds,
            }),
            FrameHeader::Text => None,
        }
    }

    /// Well-known name for this message id, if the table has it.
    pub fn name(&self) -> Option<&'static str> {
        name_for_id(self.message_id)
    }
}

/// Well-known OEM7 log ids. The table only needs to cover the messages the
/// name lookup must resolve for ASCII frames; ids for everything else are
/// carried through numerically.
const MESSAGE_IDS: &[(&str, u16)] = &[
    ("LOGLIST", 5),
    ("IONUTC", 8),
    ("VERSION", 37),
    ("RAWEPHEM", 41),
    ("BESTPOS", 42),
    ("RANGE", 43),
    ("PSRPOS", 47),
    ("TRACKSTAT", 83),
    ("RXSTATUS", 93),
    ("BESTVEL", 99),
    ("PSRVEL", 100),
    ("TIME", 101),
    ("RXCONFIG", 128),
    ("RANGECMP", 140),
    ("BESTXYZ", 241),
    ("INSPVA", 507),
    ("INSPVAS", 508),
    ("HEADING2", 1335),
    ("BESTGNSSPOS", 1429),
    ("INSPVAX", 1465),
];

/// Resolves a wire message name to its numeric id.
///
/// ASCII names carry a trailing `A` (ASCII) or `B` (binary) format suffix
/// which is stripped if the bare name does not match. Unknown names map to
/// 0; the id's meaning is defined outside this crate.
pub fn id_for_name(name: &str) -> u16 {
    if let Some(id) = lookup(name) {
        return id;
    }
    if let Some(stripped) = name.strip_suffix(['A', 'B', 'a', 'b']) {
        if let Some(id) = lookup(stripped) {
            return id;
        }
    }
    0
}

/// Reverse lookup of a well-known message id.
pub fn name_for_id(id: u16) -> Option<&'static str> {
    MESSAGE_IDS
        .iter()
        .find(|&&(_, known)| known == id)
        .map(|&(name, _)| name)
}

fn lookup(name: &str) -> Option<u16> {
    MESSAGE_IDS
        .iter()
        .find(|&&(known, _)| known.eq_ignore_ascii_case(name))
        .map(|&(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_strips_format_suffix() {
        assert_eq!(id_for_name("BESTPOS"), 42);
        assert_eq!(id_for_name("BESTPOSA"), 42);
        assert_eq!(id_for_name("BESTPOSB"), 42);
        assert_eq!(id_for_name("bestposa"), 42);
    }

    #[test]
    fn test_name_lookup_prefers_exact_match() {
        // INSPVAS is its own log, not INSPVA with a suffix.
        assert_eq!(id_for_name("INSPVAS"), 508);
        assert_eq!(id_for_name("INSPVA"), 507);
    }

    #[test]
    fn test_unknown_name_is_zero() {
        assert_eq!(id_for_name("NOSUCHLOG"), 0);
        assert_eq!(id_for_name(""), 0);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(name_for_id(42), Some("BESTPOS"));
        assert_eq!(name_for_id(9999), None);
    }

    #[test]
    fn test_binary_message_accessors() {
        let header = crate::BinaryHeader::new(42, 4).with_time(2260, 1000);
        let msg = RawMessage::binary(header, Bytes::from_static(&[1, 2, 3, 4]));

        assert_eq!(msg.message_type(), MessageType::Log);
        assert_eq!(msg.message_format(), MessageFormat::Binary);
        assert_eq!(msg.message_id(), 42);
        assert_eq!(msg.payload_len(), 4);
        assert_eq!(msg.name(), Some("BESTPOS"));
        assert_eq!(
            msg.gps_time(),
            Some(GpsTime {
                week: 2260,
                milliseconds: 1000
            })
        );
    }

    #[test]
    fn test_text_message_has_no_gps_time() {
        let msg = RawMessage::text(
            MessageFormat::Ascii,
            MessageType::Log,
            42,
            Bytes::from_static(b"data"),
        );
        assert!(msg.gps_time().is_none());
        assert!(matches!(msg.header(), FrameHeader::Text));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(MessageFormat::Binary.to_string(), "BINARY");
        assert_eq!(MessageFormat::ShortBinary.to_string(), "SHORT_BINARY");
        assert_eq!(MessageFormat::AbbrevAscii.to_string(), "ABBREV_ASCII");
        assert_eq!(MessageType::Response.to_string(), "RESPONSE");
    }
}
