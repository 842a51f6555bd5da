//! Framing errors.

use thiserror::Error;

/// Errors produced while decoding segment headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// Not enough bytes for a header (or for the payload it announces).
    #[error("truncated segment: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// Command byte outside the known set.
    #[error("unknown command: {0}")]
    UnknownCommand(u8),
}
