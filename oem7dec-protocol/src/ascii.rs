//! Delimited-frame parsing for the two text formats.
//!
//! ASCII frame layout, newline-terminated:
//!
//! ```text
//! #NAME,field,...;data,data,...*xxxxxxxx\r\n
//! ```
//!
//! The eight hex digits after `*` are the vendor CRC-32 of every character
//! strictly between `#` and `*`. Abbreviated ASCII is a terse one-line
//! variant with no checksum:
//!
//! ```text
//! <NAME field field ...\r\n
//! ```

use crate::crc::crc32;
use crate::error::ProtocolError;
use crate::message::{self, MessageType};
use crate::{ABBREV_ASCII_SYNC, ASCII_SYNC};

/// A parsed ASCII frame. Offsets index into the frame's own bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiFrame {
    /// Message name as it appears on the wire, format suffix included.
    pub name: String,
    /// Numeric id resolved from the name table; 0 for unknown names.
    pub message_id: u16,
    /// Full frame size including the line terminator.
    pub frame_len: usize,
    /// Data section: bytes between `;` and `*`.
    pub body: (usize, usize),
    pub declared_crc: u32,
    pub computed_crc: u32,
}

impl AsciiFrame {
    /// Parses one ASCII frame from the start of `buf` (which must begin at
    /// `#`). Returns `Ok(None)` until the line terminator has arrived;
    /// bounding unterminated input is the caller's concern.
    pub fn parse(buf: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if buf.is_empty() {
            return Ok(None);
        }
        if buf[0] != ASCII_SYNC {
            return Err(ProtocolError::MalformedAscii("missing '#' sync"));
        }

        let Some(newline) = find_newline(buf) else {
            return Ok(None);
        };
        let frame_len = newline + 1;
        let end = content_end(buf, newline);

        // '*' plus exactly eight hex digits close the frame.
        if end < 10 {
            return Err(ProtocolError::MalformedAscii("frame too short for a checksum"));
        }
        let star = end - 9;
        if buf[star] != b'*' {
            return Err(ProtocolError::MalformedAscii("missing '*' checksum delimiter"));
        }
        let declared_crc = parse_crc_hex(&buf[star + 1..end])?;

        let header = &buf[1..star];
        let Some(semicolon) = header.iter().position(|&b| b == b';') else {
            return Err(ProtocolError::MalformedAscii("missing ';' header terminator"));
        };
        let name_bytes = header
            .split(|&b| b == b',')
            .next()
            .unwrap_or(&[]);
        let name_end = name_bytes.len().min(semicolon);
        let name = std::str::from_utf8(&header[..name_end])
            .map_err(|_| ProtocolError::MalformedAscii("non-utf8 message name"))?;
        if name.is_empty() {
            return Err(ProtocolError::MalformedAscii("empty message name"));
        }

        Ok(Some(Self {
            name: name.to_string(),
            message_id: message::id_for_name(name),
            frame_len,
            body: (1 + semicolon + 1, star),
            declared_crc,
            computed_crc: crc32(&buf[1..star]),
        }))
    }

    /// Whether the declared and computed checksums agree.
    pub fn crc_ok(&self) -> bool {
        self.declared_crc == self.computed_crc
    }
}

/// A parsed abbreviated ASCII frame (one line, no checksum).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbbrevFrame {
    /// First whitespace-delimited token after `<`.
    pub name: String,
    /// Numeric id resolved from the name table; 0 for unknown names.
    pub message_id: u16,
    /// Log, or Response for receiver command acknowledgements.
    pub message_type: MessageType,
    /// Full frame size including the line terminator.
    pub frame_len: usize,
    /// Line content after `<`, without the terminator.
    pub body: (usize, usize),
}

impl AbbrevFrame {
    /// Parses one abbreviated ASCII frame from the start of `buf` (which
    /// must begin at `<`). Returns `Ok(None)` until the terminator arrives.
    pub fn parse(buf: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if buf.is_empty() {
            return Ok(None);
        }
        if buf[0] != ABBREV_ASCII_SYNC {
            return Err(ProtocolError::MalformedAscii("missing '<' sync"));
        }

        let Some(newline) = find_newline(buf) else {
            return Ok(None);
        };
        let frame_len = newline + 1;
        let end = content_end(buf, newline);

        let content = &buf[1..end];
        let token = content
            .split(|&b| b == b' ')
            .next()
            .unwrap_or(&[]);
        let name = std::str::from_utf8(token)
            .map_err(|_| ProtocolError::MalformedAscii("non-utf8 message name"))?;

        let message_type = if name == "OK" || name.starts_with("ERROR") {
            MessageType::Response
        } else {
            MessageType::Log
        };

        Ok(Some(Self {
            name: name.to_string(),
            message_id: message::id_for_name(name),
            message_type,
            frame_len,
            body: (1, end),
        }))
    }
}

fn find_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

/// Content length of a line, with an optional `\r` before the `\n` stripped.
fn content_end(buf: &[u8], newline: usize) -> usize {
    if newline >= 1 && buf[newline - 1] == b'\r' {
        newline - 1
    } else {
        newline
    }
}

fn parse_crc_hex(digits: &[u8]) -> Result<u32, ProtocolError> {
    if digits.len() != 8 {
        return Err(ProtocolError::MalformedAscii("checksum is not 8 hex digits"));
    }
    let bytes = hex::decode(digits)
        .map_err(|_| ProtocolError::MalformedAscii("invalid checksum hex"))?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    #[test]
    fn test_ascii_frame_parse() {
        let buf = encode::ascii_frame(
            "BESTPOSA",
            &["COM1", "0", "55.0", "FINESTEERING", "2260", "413500.000"],
            &["SOL_COMPUTED", "SINGLE", "51.116", "-114.038", "1064.9"],
        );

        let frame = AsciiFrame::parse(&buf).unwrap().unwrap();
        assert_eq!(frame.name, "BESTPOSA");
        assert_eq!(frame.message_id, 42);
        assert_eq!(frame.frame_len, buf.len());
        assert!(frame.crc_ok());
        assert_eq!(
            &buf[frame.body.0..frame.body.1],
            b"SOL_COMPUTED,SINGLE,51.116,-114.038,1064.9"
        );
    }

    #[test]
    fn test_ascii_frame_needs_terminator() {
        let buf = encode::ascii_frame("VERSIONA", &["COM1"], &["1"]);
        assert!(AsciiFrame::parse(&buf[..buf.len() - 2]).unwrap().is_none());
    }

    #[test]
    fn test_ascii_frame_bare_newline_accepted() {
        let mut buf = encode::ascii_frame("VERSIONA", &["COM1"], &["1"]).to_vec();
        buf.remove(buf.len() - 2); // drop the '\r'
        let frame = AsciiFrame::parse(&buf).unwrap().unwrap();
        assert!(frame.crc_ok());
        assert_eq!(frame.frame_len, buf.len());
    }

    #[test]
    fn test_ascii_frame_corrupted_body_fails_crc() {
        let mut buf = encode::ascii_frame("BESTPOSA", &["COM1"], &["SOL_COMPUTED", "SINGLE"]);
        let mid = buf.len() / 2;
        buf[mid] ^= 0x01;
        let frame = AsciiFrame::parse(&buf).unwrap().unwrap();
        assert!(!frame.crc_ok());
    }

    #[test]
    fn test_ascii_frame_missing_semicolon() {
        let line = b"#BESTPOSA,COM1,0*12345678\r\n";
        let result = AsciiFrame::parse(line);
        assert!(matches!(result, Err(ProtocolError::MalformedAscii(_))));
    }

    #[test]
    fn test_ascii_frame_missing_star() {
        let line = b"#BESTPOSA,COM1;data,data\r\n";
        let result = AsciiFrame::parse(line);
        assert!(matches!(result, Err(ProtocolError::MalformedAscii(_))));
    }

    #[test]
    fn test_ascii_frame_bad_hex_trailer() {
        let line = b"#BESTPOSA,COM1;data*zzzzzzzz\r\n";
        let result = AsciiFrame::parse(line);
        assert!(matches!(result, Err(ProtocolError::MalformedAscii(_))));
    }

    #[test]
    fn test_ascii_unknown_name_maps_to_zero() {
        let buf = encode::ascii_frame("NOSUCHLOGA", &["COM1"], &["1"]);
        let frame = AsciiFrame::parse(&buf).unwrap().unwrap();
        assert_eq!(frame.message_id, 0);
    }

    #[test]
    fn test_abbrev_log_line() {
        let line = b"<BESTPOS COM1 0 72.0 FINESTEERING 2260 413500.000\r\n";
        let frame = AbbrevFrame::parse(line).unwrap().unwrap();
        assert_eq!(frame.name, "BESTPOS");
        assert_eq!(frame.message_id, 42);
        assert_eq!(frame.message_type, MessageType::Log);
        assert_eq!(frame.frame_len, line.len());
        assert_eq!(
            &line[frame.body.0..frame.body.1],
            b"BESTPOS COM1 0 72.0 FINESTEERING 2260 413500.000"
        );
    }

    #[test]
    fn test_abbrev_ok_is_response() {
        let line = b"<OK\r\n";
        let frame = AbbrevFrame::parse(line).unwrap().unwrap();
        assert_eq!(frame.message_type, MessageType::Response);
        assert_eq!(frame.name, "OK");
    }

    #[test]
    fn test_abbrev_error_is_response() {
        let line = b"<ERROR:Invalid Message ID\r\n";
        let frame = AbbrevFrame::parse(line).unwrap().unwrap();
        assert_eq!(frame.message_type, MessageType::Response);
    }

    #[test]
    fn test_abbrev_needs_terminator() {
        assert!(AbbrevFrame::parse(b"<BESTPOS COM1").unwrap().is_none());
    }

    #[test]
    fn test_abbrev_continuation_line_is_its_own_frame() {
        let line = b"<     SOL_COMPUTED SINGLE 51.116 -114.038\r\n";
        let frame = AbbrevFrame::parse(line).unwrap().unwrap();
        assert_eq!(frame.message_id, 0);
        assert_eq!(frame.message_type, MessageType::Log);
    }
}
