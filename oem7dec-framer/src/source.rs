//! The byte source boundary.
//!
//! Transport acquisition (serial ports, sockets, files) is the host's
//! business; the framer only ever sees this narrow pull interface.

use std::io;

/// Result of one source read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStatus {
    /// Bytes written into the caller's buffer.
    pub bytes_read: usize,
    /// False means no further bytes will ever arrive (graceful end).
    /// Zero bytes with `open` still true means "no data right now".
    pub open: bool,
}

/// Supplies raw bytes on demand.
///
/// The framer makes no assumption about blocking behavior; it reacts only
/// to the returned status. An `Err` is a source fault, distinct from
/// graceful exhaustion.
pub trait ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<ReadStatus>;
}

/// Adapts any `std::io::Read` into a `ByteSource`.
///
/// `Ok(0)` from the reader is treated as closed; `Interrupted` and
/// `WouldBlock` map to "no data right now" rather than a fault.
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
}

impl<R> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> ByteSource for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<ReadStatus> {
        match self.inner.read(buf) {
            Ok(0) => Ok(ReadStatus {
                bytes_read: 0,
                open: false,
            }),
            Ok(n) => Ok(ReadStatus {
                bytes_read: n,
                open: true,
            }),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) =>
            {
                Ok(ReadStatus {
                    bytes_read: 0,
                    open: true,
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// In-memory source delivering a fixed byte sequence, optionally in small
/// chunks to exercise partial reads. Closes when the data runs out.
#[derive(Debug)]
pub struct SliceSource {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl SliceSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk: usize::MAX,
        }
    }

    /// Delivers at most `chunk` bytes per read.
    pub fn chunked(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        assert!(chunk > 0, "chunk size must be nonzero");
        Self {
            data: data.into(),
            pos: 0,
            chunk,
        }
    }
}

impl ByteSource for SliceSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<ReadStatus> {
        let remaining = self.data.len() - self.pos;
        if remaining == 0 {
            return Ok(ReadStatus {
                bytes_read: 0,
                open: false,
            });
        }
        let n = remaining.min(buf.len()).min(self.chunk);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(ReadStatus {
            bytes_read: n,
            open: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_source_maps_eof_to_closed() {
        let mut source = ReadSource::new(io::Cursor::new(vec![1u8, 2, 3]));
        let mut buf = [0u8; 8];

        let status = source.read(&mut buf).unwrap();
        assert_eq!(status.bytes_read, 3);
        assert!(status.open);

        let status = source.read(&mut buf).unwrap();
        assert_eq!(status.bytes_read, 0);
        assert!(!status.open);
    }

    #[test]
    fn test_read_source_maps_would_block_to_no_data() {
        struct Flaky(u32);
        impl io::Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.0 += 1;
                match self.0 {
                    1 => Err(io::Error::from(io::ErrorKind::WouldBlock)),
                    2 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    _ => {
                        buf[0] = 0xAA;
                        Ok(1)
                    }
                }
            }
        }

        let mut source = ReadSource::new(Flaky(0));
        let mut buf = [0u8; 8];

        for _ in 0..2 {
            let status = source.read(&mut buf).unwrap();
            assert_eq!(status.bytes_read, 0);
            assert!(status.open);
        }
        let status = source.read(&mut buf).unwrap();
        assert_eq!(status.bytes_read, 1);
    }

    #[test]
    fn test_read_source_propagates_faults() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::ConnectionReset))
            }
        }

        let mut source = ReadSource::new(Broken);
        assert!(source.read(&mut [0u8; 8]).is_err());
    }

    #[test]
    fn test_slice_source_chunking() {
        let mut source = SliceSource::chunked(vec![1u8, 2, 3, 4, 5], 2);
        let mut buf = [0u8; 8];

        assert_eq!(source.read(&mut buf).unwrap().bytes_read, 2);
        assert_eq!(source.read(&mut buf).unwrap().bytes_read, 2);
        assert_eq!(source.read(&mut buf).unwrap().bytes_read, 1);

        let status = source.read(&mut buf).unwrap();
        assert_eq!(status.bytes_read, 0);
        assert!(!status.open);
    }
}
