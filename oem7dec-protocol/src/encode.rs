//! Frame encoders.
//!
//! Produce well-formed frames from parts; the decoder's round-trip tests
//! and the benchmarks are built on these.

use crate::crc::{crc32, update};
use crate::error::ProtocolError;
use crate::header::{BinaryHeader, ShortHeader};
use crate::{ASCII_SYNC, BINARY_HEADER_LEN};
use bytes::{BufMut, BytesMut};

/// Encodes a complete binary frame: header, payload, trailing CRC.
///
/// The header must declare the standard 28-byte length and a payload
/// length matching `payload`.
pub fn binary_frame(header: &BinaryHeader, payload: &[u8]) -> Result<BytesMut, ProtocolError> {
    if header.header_length as usize != BINARY_HEADER_LEN {
        return Err(ProtocolError::NonStandardHeader(header.header_length));
    }
    if payload.len() != header.payload_length as usize {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: header.payload_length as usize,
            actual: payload.len(),
        });
    }

    let mut buf = BytesMut::with_capacity(header.frame_len());
    header.encode_into(&mut buf);
    buf.put_slice(payload);
    let crc = crc32(&buf);
    buf.put_u32_le(crc);
    Ok(buf)
}

/// Encodes a complete short binary frame.
pub fn short_frame(header: &ShortHeader, payload: &[u8]) -> Result<BytesMut, ProtocolError> {
    if payload.len() != header.payload_length as usize {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: header.payload_length as usize,
            actual: payload.len(),
        });
    }

    let mut buf = BytesMut::with_capacity(header.frame_len());
    header.encode_into(&mut buf);
    buf.put_slice(payload);
    let crc = crc32(&buf);
    buf.put_u32_le(crc);
    Ok(buf)
}

/// Encodes an ASCII frame: `#NAME,fields;body*crc\r\n`.
///
/// The checksum covers everything between `#` and `*`.
pub fn ascii_frame(name: &str, header_fields: &[&str], body_fields: &[&str]) -> BytesMut {
    let mut line = String::from(name);
    for field in header_fields {
        line.push(',');
        line.push_str(field);
    }
    line.push(';');
    line.push_str(&body_fields.join(","));

    let crc = update(0, line.as_bytes());
    let mut buf = BytesMut::with_capacity(line.len() + 16);
    buf.put_u8(ASCII_SYNC);
    buf.put_slice(line.as_bytes());
    buf.put_slice(format!("*{crc:08x}\r\n").as_bytes());
    buf
}

/// Encodes an abbreviated ASCII frame: `<content\r\n`.
pub fn abbrev_frame(content: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(content.len() + 3);
    buf.put_u8(crate::ABBREV_ASCII_SYNC);
    buf.put_slice(content.as_bytes());
    buf.put_slice(b"\r\n");
    buf
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::ascii::AsciiFrame;
    use crate::CRC_LEN;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn binary_frames_always_revalidate(
            payload in proptest::collection::vec(any::<u8>(), 0..512),
            id in any::<u16>(),
        ) {
            let header = BinaryHeader::new(id, payload.len() as u16);
            let frame = binary_frame(&header, &payload).unwrap();

            let decoded = BinaryHeader::decode(&frame).unwrap().unwrap();
            prop_assert_eq!(decoded.message_id, id);
            prop_assert_eq!(decoded.frame_len(), frame.len());

            let body = frame.len() - CRC_LEN;
            let declared = u32::from_le_bytes(frame[body..].try_into().unwrap());
            prop_assert_eq!(declared, crc32(&frame[..body]));
        }

        #[test]
        fn ascii_frames_always_reparse(
            name in "[A-Z]{3,10}",
            fields in proptest::collection::vec("[A-Z0-9.]{1,12}", 0..6),
            body in proptest::collection::vec("[A-Z0-9.-]{1,16}", 0..8),
        ) {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let body: Vec<&str> = body.iter().map(String::as_str).collect();
            let frame = ascii_frame(&name, &fields, &body);

            let parsed = AsciiFrame::parse(&frame).unwrap().unwrap();
            prop_assert!(parsed.crc_ok());
            prop_assert_eq!(parsed.frame_len, frame.len());
            prop_assert_eq!(parsed.name, name);
        }
    }
}
