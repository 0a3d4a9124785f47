//! Framer error types.

use thiserror::Error;

/// Stream-terminal errors surfaced by `read_next`.
///
/// Graceful exhaustion is not an error (it is the `Ok(None)` result);
/// these are the conditions a host may want to react to, e.g. by
/// reconnecting its transport.
#[derive(Debug, Error)]
pub enum FramerError {
    /// The byte source reported a fault, distinct from running dry.
    #[error("byte source fault: {0}")]
    Source(#[from] std::io::Error),

    /// The source returned "no data right now" too many times in a row
    /// without ever closing; the decode call gives up rather than spin.
    #[error("no progress after {reads} consecutive empty reads")]
    Stalled { reads: u32 },
}
