//! # oem7dec-framer
//!
//! Streaming framer for the OEM7 wire protocol.
//!
//! This crate provides:
//! - `ByteSource`, the narrow pull interface the framer reads from
//! - `Framer`, the synchronization/classification/validation state machine
//! - `MessageDecoder`, the read-one-message facade bound to one source
//!
//! The framer is synchronous and single-threaded: `read_next` blocks only
//! as far as the underlying source's read blocks, performs no sleeping or
//! polling of its own, and keeps no locks. One `Framer` owns exactly one
//! decode buffer; callers needing shared access must serialize externally.

mod buffer;
mod scan;

pub mod decoder;
pub mod error;
pub mod framer;
pub mod source;

pub use decoder::{MessageDecoder, ENGINE_VERSION};
pub use error::FramerError;
pub use framer::{Framer, FramerConfig, FramerStats};
pub use source::{ByteSource, ReadSource, ReadStatus, SliceSource};

/// Default bound on an unterminated text frame before it is rejected.
pub const DEFAULT_MAX_TEXT_FRAME: usize = 16 * 1024;

/// Default cap on consecutive empty reads within one decode call.
pub const DEFAULT_MAX_EMPTY_READS: u32 = 8192;
