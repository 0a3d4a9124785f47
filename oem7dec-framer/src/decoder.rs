//! The public read-one-message facade.

use crate::error::FramerError;
use crate::framer::{Framer, FramerConfig, FramerStats};
use crate::source::ByteSource;
use oem7dec_protocol::RawMessage;

/// Decoding engine revision, reported for host compatibility logging.
pub const ENGINE_VERSION: (u16, u16, u16) = (0, 1, 0);

/// Binds one framer to one byte source for its whole lifetime.
///
/// Not safe for concurrent invocation: callers sharing a decoder across
/// threads must serialize access themselves. No internal locking is done,
/// keeping the hot path allocation- and lock-free.
pub struct MessageDecoder<S> {
    framer: Framer<S>,
}

impl<S: ByteSource> MessageDecoder<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, FramerConfig::default())
    }

    pub fn with_config(source: S, config: FramerConfig) -> Self {
        Self {
            framer: Framer::with_config(source, config),
        }
    }

    /// Reads the next message, blocking only as far as the source blocks.
    ///
    /// `Ok(None)` is graceful end of stream and keeps being returned while
    /// the source stays closed; `Err` is a source fault or a stalled
    /// source, distinguishable so the host can decide to reconnect.
    pub fn read_next(&mut self) -> Result<Option<RawMessage>, FramerError> {
        self.framer.read_message()
    }

    pub fn stats(&self) -> &FramerStats {
        self.framer.stats()
    }

    /// (major, minor, patch) of the decoding engine.
    pub fn engine_version(&self) -> (u16, u16, u16) {
        ENGINE_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SliceSource;
    use oem7dec_protocol::{encode, BinaryHeader, MessageFormat};

    #[test]
    fn test_facade_reads_and_reports_eos() {
        let header = BinaryHeader::new(42, 2);
        let frame = encode::binary_frame(&header, &[1, 2]).unwrap();

        let mut decoder = MessageDecoder::new(SliceSource::new(frame.to_vec()));
        let msg = decoder.read_next().unwrap().unwrap();
        assert_eq!(msg.message_format(), MessageFormat::Binary);
        assert!(decoder.read_next().unwrap().is_none());
        assert_eq!(decoder.stats().messages, 1);
    }

    #[test]
    fn test_engine_version_is_reported() {
        let decoder = MessageDecoder::new(SliceSource::new(Vec::new()));
        assert_eq!(decoder.engine_version(), ENGINE_VERSION);
    }

    #[test]
    fn test_decodes_from_a_file() {
        use crate::source::ReadSource;
        use std::io::{Seek, SeekFrom, Write};

        let header = BinaryHeader::new(42, 3);
        let frame = encode::binary_frame(&header, &[1, 2, 3]).unwrap();

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&frame).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut decoder = MessageDecoder::new(ReadSource::new(file));
        let msg = decoder.read_next().unwrap().unwrap();
        assert_eq!(msg.message_id(), 42);
        assert_eq!(&msg.payload()[..], &[1, 2, 3]);
        assert!(decoder.read_next().unwrap().is_none());
    }
}
