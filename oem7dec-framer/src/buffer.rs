//! The framer's accumulating byte window.
//!
//! A `BytesMut` plus an absolute stream offset. Bytes before the cursor
//! are gone; positions inside the window are plain integer offsets, so
//! compaction never invalidates an in-flight index.

use bytes::{Buf, Bytes, BytesMut};

pub(crate) struct DecodeBuffer {
    buf: BytesMut,
    consumed: u64,
}

impl DecodeBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            consumed: 0,
        }
    }

    /// Unconsumed bytes, cursor through high-water mark.
    pub(crate) fn window(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Drops `n` leading bytes.
    pub(crate) fn discard(&mut self, n: usize) {
        debug_assert!(n <= self.buf.len());
        self.buf.advance(n);
        self.consumed += n as u64;
    }

    /// Detaches `n` leading bytes as an immutable frame.
    pub(crate) fn take(&mut self, n: usize) -> Bytes {
        self.consumed += n as u64;
        self.buf.split_to(n).freeze()
    }

    /// Absolute offset of the cursor from the start of the stream; used
    /// for diagnostics.
    pub(crate) fn stream_offset(&self) -> u64 {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_and_take_advance_offset() {
        let mut buf = DecodeBuffer::with_capacity(64);
        buf.extend(b"garbage#frame");
        assert_eq!(buf.len(), 13);

        buf.discard(7);
        assert_eq!(buf.window(), b"#frame");
        assert_eq!(buf.stream_offset(), 7);

        let frame = buf.take(6);
        assert_eq!(&frame[..], b"#frame");
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.stream_offset(), 13);
    }

    #[test]
    fn test_taken_bytes_outlive_later_appends() {
        let mut buf = DecodeBuffer::with_capacity(8);
        buf.extend(b"first");
        let first = buf.take(5);
        buf.extend(b"second payload that forces growth");
        assert_eq!(&first[..], b"first");
    }
}
