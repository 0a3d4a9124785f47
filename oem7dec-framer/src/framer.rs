//! The framing state machine.
//!
//! Drives sync scan, header parse, payload accumulation, and integrity
//! validation over repeated source reads, producing at most one message
//! per externally visible call. Corruption is answered by dropping bytes
//! up to and including the failed frame and rescanning; only the source
//! itself can end or fail the stream.

use crate::buffer::DecodeBuffer;
use crate::error::FramerError;
use crate::scan::{scan, ScanOutcome, SyncKind};
use crate::source::ByteSource;
use crate::{DEFAULT_MAX_EMPTY_READS, DEFAULT_MAX_TEXT_FRAME};
use oem7dec_protocol::crc::crc32;
use oem7dec_protocol::{
    AbbrevFrame, AsciiFrame, BinaryHeader, MessageFormat, MessageType, RawMessage, ShortHeader,
    CRC_LEN,
};

/// Bytes requested from the source per read.
const READ_CHUNK: usize = 4096;

/// Framer tuning knobs.
#[derive(Debug, Clone)]
pub struct FramerConfig {
    /// Emit recognized-but-foreign frames (NMEA sentences) as
    /// `MessageFormat::Unknown` instead of discarding them.
    pub allow_unknown: bool,
    /// Bound on an unterminated text frame before it is rejected.
    pub max_text_frame: usize,
    /// Cap on consecutive "no data right now" reads within one decode
    /// call before giving up with `FramerError::Stalled`.
    pub max_empty_reads: u32,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            allow_unknown: false,
            max_text_frame: DEFAULT_MAX_TEXT_FRAME,
            max_empty_reads: DEFAULT_MAX_EMPTY_READS,
        }
    }
}

impl FramerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    pub fn with_max_text_frame(mut self, bound: usize) -> Self {
        self.max_text_frame = bound;
        self
    }

    pub fn with_max_empty_reads(mut self, cap: u32) -> Self {
        self.max_empty_reads = cap;
        self
    }
}

/// Running decode counters, for host diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Messages emitted, unknown pass-through included.
    pub messages: u64,
    /// Frames dropped for a checksum mismatch.
    pub crc_failures: u64,
    /// Noise, failed frames, and truncated tails dropped, in bytes.
    pub bytes_discarded: u64,
    /// Foreign frames emitted as `MessageFormat::Unknown`.
    pub unknown_frames: u64,
}

/// A frame whose header has been accepted and whose extent is known.
#[derive(Debug)]
enum PendingFrame {
    Binary(BinaryHeader),
    Short(ShortHeader),
    Ascii(AsciiFrame),
}

impl PendingFrame {
    fn frame_len(&self) -> usize {
        match self {
            PendingFrame::Binary(h) => h.frame_len(),
            PendingFrame::Short(h) => h.frame_len(),
            PendingFrame::Ascii(f) => f.frame_len,
        }
    }
}

#[derive(Debug)]
enum State {
    SeekingSync,
    ParsingHeader(SyncKind),
    AwaitingPayload(PendingFrame),
    Validating(PendingFrame),
    StreamEnded,
    StreamError,
}

enum Fill {
    Data,
    Empty,
    Closed,
}

/// The framing engine: one source, one buffer, one state.
pub struct Framer<S> {
    source: S,
    buffer: DecodeBuffer,
    state: State,
    config: FramerConfig,
    stats: FramerStats,
    empty_reads: u32,
    source_closed: bool,
}

impl<S: ByteSource> Framer<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, FramerConfig::default())
    }

    pub fn with_config(source: S, config: FramerConfig) -> Self {
        Self {
            source,
            buffer: DecodeBuffer::with_capacity(READ_CHUNK * 2),
            state: State::SeekingSync,
            config,
            stats: FramerStats::default(),
            empty_reads: 0,
            source_closed: false,
        }
    }

    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    /// Decodes the next message from the stream.
    ///
    /// Returns `Ok(Some(message))` for each validated frame, `Ok(None)`
    /// once the source has gracefully closed, and `Err` for source faults
    /// or a stalled source. Any number of corrupted frames may be skipped
    /// inside a single call.
    pub fn read_message(&mut self) -> Result<Option<RawMessage>, FramerError> {
        self.empty_reads = 0;
        match self.state {
            // Closure is permanent; keep reporting end of stream.
            State::StreamEnded => return Ok(None),
            // After a fault the host decides; a further call retries the
            // source once more.
            State::StreamError => self.state = State::SeekingSync,
            _ => {}
        }

        loop {
            let state = std::mem::replace(&mut self.state, State::SeekingSync);
            match state {
                State::SeekingSync => match scan(self.buffer.window()) {
                    ScanOutcome::Found { noise, kind } => {
                        if noise > 0 {
                            self.drop_noise(noise);
                        }
                        self.state = State::ParsingHeader(kind);
                    }
                    ScanOutcome::NeedMore { noise } => {
                        if noise > 0 {
                            self.drop_noise(noise);
                        }
                        if !self.fill_or_end()? {
                            return Ok(None);
                        }
                    }
                },

                State::ParsingHeader(kind) => match kind {
                    SyncKind::Binary => match BinaryHeader::decode(self.buffer.window()) {
                        Ok(Some(header)) => {
                            self.state = State::AwaitingPayload(PendingFrame::Binary(header));
                        }
                        Ok(None) => {
                            self.state = State::ParsingHeader(kind);
                            if !self.fill_or_end()? {
                                return Ok(None);
                            }
                        }
                        Err(err) => {
                            self.recover(&format!("binary header rejected ({err})"), 1);
                        }
                    },

                    SyncKind::ShortBinary => match ShortHeader::decode(self.buffer.window()) {
                        Ok(Some(header)) => {
                            self.state = State::AwaitingPayload(PendingFrame::Short(header));
                        }
                        Ok(None) => {
                            self.state = State::ParsingHeader(kind);
                            if !self.fill_or_end()? {
                                return Ok(None);
                            }
                        }
                        Err(err) => {
                            self.recover(&format!("short binary header rejected ({err})"), 1);
                        }
                    },

                    SyncKind::Ascii => match AsciiFrame::parse(self.buffer.window()) {
                        Ok(Some(frame)) => {
                            self.state = State::Validating(PendingFrame::Ascii(frame));
                        }
                        Ok(None) => {
                            if self.buffer.len() >= self.config.max_text_frame {
                                self.recover("unterminated ascii frame exceeded bound", 1);
                            } else {
                                self.state = State::ParsingHeader(kind);
                                if !self.fill_or_end()? {
                                    return Ok(None);
                                }
                            }
                        }
                        Err(err) => {
                            let skip = line_extent(self.buffer.window()).unwrap_or(1);
                            self.recover(&format!("ascii frame rejected ({err})"), skip);
                        }
                    },

                    SyncKind::AbbrevAscii => match AbbrevFrame::parse(self.buffer.window()) {
                        Ok(Some(frame)) => {
                            let bytes = self.buffer.take(frame.frame_len);
                            let payload = bytes.slice(frame.body.0..frame.body.1);
                            return self.emit(RawMessage::text(
                                MessageFormat::AbbrevAscii,
                                frame.message_type,
                                frame.message_id,
                                payload,
                            ));
                        }
                        Ok(None) => {
                            if self.buffer.len() >= self.config.max_text_frame {
                                self.recover("unterminated abbreviated ascii frame exceeded bound", 1);
                            } else {
                                self.state = State::ParsingHeader(kind);
                                if !self.fill_or_end()? {
                                    return Ok(None);
                                }
                            }
                        }
                        Err(err) => {
                            let skip = line_extent(self.buffer.window()).unwrap_or(1);
                            self.recover(&format!("abbreviated ascii frame rejected ({err})"), skip);
                        }
                    },

                    SyncKind::Nmea => match line_extent(self.buffer.window()) {
                        Some(len) => {
                            if self.config.allow_unknown {
                                let frame = self.buffer.take(len);
                                let end = if len >= 2 && frame[len - 2] == b'\r' {
                                    len - 2
                                } else {
                                    len - 1
                                };
                                self.stats.unknown_frames += 1;
                                return self.emit(RawMessage::text(
                                    MessageFormat::Unknown,
                                    MessageType::Log,
                                    0,
                                    frame.slice(..end),
                                ));
                            }
                            tracing::trace!("discarding foreign sentence of {} bytes", len);
                            self.stats.bytes_discarded += len as u64;
                            self.buffer.discard(len);
                        }
                        None => {
                            if self.buffer.len() >= self.config.max_text_frame {
                                self.recover("unterminated foreign sentence exceeded bound", 1);
                            } else {
                                self.state = State::ParsingHeader(kind);
                                if !self.fill_or_end()? {
                                    return Ok(None);
                                }
                            }
                        }
                    },
                },

                State::AwaitingPayload(pending) => {
                    let need = pending.frame_len();
                    if self.buffer.len() >= need {
                        self.state = State::Validating(pending);
                    } else {
                        self.state = State::AwaitingPayload(pending);
                        if !self.fill_or_end()? {
                            return Ok(None);
                        }
                    }
                }

                State::Validating(pending) => match pending {
                    PendingFrame::Binary(header) => {
                        let frame_len = header.frame_len();
                        if self.frame_crc_ok(frame_len) {
                            let frame = self.buffer.take(frame_len);
                            let start = header.header_length as usize;
                            let payload =
                                frame.slice(start..start + header.payload_length as usize);
                            return self.emit(RawMessage::binary(header, payload));
                        }
                        self.drop_bad_frame("binary", frame_len);
                    }
                    PendingFrame::Short(header) => {
                        let frame_len = header.frame_len();
                        if self.frame_crc_ok(frame_len) {
                            let frame = self.buffer.take(frame_len);
                            let start = oem7dec_protocol::SHORT_HEADER_LEN;
                            let payload =
                                frame.slice(start..start + header.payload_length as usize);
                            return self.emit(RawMessage::short(header, payload));
                        }
                        self.drop_bad_frame("short binary", frame_len);
                    }
                    PendingFrame::Ascii(frame) => {
                        if frame.crc_ok() {
                            let bytes = self.buffer.take(frame.frame_len);
                            let payload = bytes.slice(frame.body.0..frame.body.1);
                            return self.emit(RawMessage::text(
                                MessageFormat::Ascii,
                                MessageType::Log,
                                frame.message_id,
                                payload,
                            ));
                        }
                        self.drop_bad_frame("ascii", frame.frame_len);
                    }
                },

                State::StreamEnded | State::StreamError => unreachable!("handled on entry"),
            }
        }
    }

    /// Compares the trailing CRC of the frame at the window start against
    /// the computed one.
    fn frame_crc_ok(&self, frame_len: usize) -> bool {
        let window = self.buffer.window();
        debug_assert!(window.len() >= frame_len);
        let body = frame_len - CRC_LEN;
        let declared = u32::from_le_bytes([
            window[body],
            window[body + 1],
            window[body + 2],
            window[body + 3],
        ]);
        declared == crc32(&window[..body])
    }

    fn emit(&mut self, message: RawMessage) -> Result<Option<RawMessage>, FramerError> {
        self.state = State::SeekingSync;
        self.stats.messages += 1;
        Ok(Some(message))
    }

    fn drop_noise(&mut self, n: usize) {
        tracing::trace!(
            "discarding {} noise bytes at offset {}",
            n,
            self.buffer.stream_offset()
        );
        self.stats.bytes_discarded += n as u64;
        self.buffer.discard(n);
    }

    /// Discards `skip` bytes after a local parse failure and resumes sync
    /// search. The sync byte that led here is always consumed, so the scan
    /// makes progress.
    fn recover(&mut self, what: &str, skip: usize) {
        debug_assert!(self.buffer.len() > 0);
        let skip = skip.min(self.buffer.len()).max(1);
        tracing::debug!(
            "{} at offset {}, dropping {} bytes and rescanning",
            what,
            self.buffer.stream_offset(),
            skip
        );
        self.stats.bytes_discarded += skip as u64;
        self.buffer.discard(skip);
    }

    fn drop_bad_frame(&mut self, format: &str, frame_len: usize) {
        self.stats.crc_failures += 1;
        tracing::debug!(
            "crc mismatch on {} frame at offset {}, dropping {} bytes",
            format,
            self.buffer.stream_offset(),
            frame_len
        );
        self.stats.bytes_discarded += frame_len as u64;
        self.buffer.discard(frame_len);
    }

    /// Pulls more bytes from the source. `Ok(false)` means the source has
    /// closed: any truncated remainder is dropped and the stream ends.
    fn fill_or_end(&mut self) -> Result<bool, FramerError> {
        match self.fill()? {
            Fill::Data | Fill::Empty => Ok(true),
            Fill::Closed => {
                let leftover = self.buffer.len();
                if leftover > 0 {
                    tracing::trace!("dropping {} unframed bytes at end of stream", leftover);
                    self.stats.bytes_discarded += leftover as u64;
                    self.buffer.discard(leftover);
                }
                self.state = State::StreamEnded;
                Ok(false)
            }
        }
    }

    fn fill(&mut self) -> Result<Fill, FramerError> {
        if self.source_closed {
            return Ok(Fill::Closed);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let status = match self.source.read(&mut chunk) {
            Ok(status) => status,
            Err(err) => {
                self.state = State::StreamError;
                return Err(FramerError::Source(err));
            }
        };

        if !status.open {
            self.source_closed = true;
        }
        if status.bytes_read > 0 {
            self.empty_reads = 0;
            self.buffer.extend(&chunk[..status.bytes_read]);
            return Ok(Fill::Data);
        }
        if status.open {
            self.empty_reads += 1;
            if self.empty_reads >= self.config.max_empty_reads {
                self.state = State::StreamError;
                return Err(FramerError::Stalled {
                    reads: self.empty_reads,
                });
            }
            return Ok(Fill::Empty);
        }
        Ok(Fill::Closed)
    }
}

fn line_extent(window: &[u8]) -> Option<usize> {
    window.iter().position(|&b| b == b'\n').map(|p| p + 1)
}
