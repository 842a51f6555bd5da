//! Engine error types.

use arqsim_proto::ProtoError;
use thiserror::Error;

/// Errors from `send`, `input` and configuration calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `send` called with no bytes.
    #[error("payload is empty")]
    EmptyPayload,

    /// Message would not fit in the receive window.
    #[error("message needs {fragments} fragments, limit is {limit}")]
    TooManyFragments {
        /// Fragments the message would need.
        fragments: usize,
        /// Largest accepted fragment count (exclusive).
        limit: usize,
    },

    /// MTU outside the supported range.
    #[error("invalid MTU {mtu}: must be within {min}..={max}")]
    InvalidMtu {
        /// Requested MTU.
        mtu: usize,
        /// Minimum MTU.
        min: usize,
        /// Maximum MTU.
        max: usize,
    },

    /// Datagram belongs to another conversation.
    #[error("conversation mismatch: expected {expected}, got {actual}")]
    ConversationMismatch {
        /// Our conversation id.
        expected: u32,
        /// Id found in the segment.
        actual: u32,
    },

    /// Header announces more payload than the datagram carries.
    #[error("segment announces {announced} payload bytes, only {available} present")]
    LengthMismatch {
        /// Length from the header.
        announced: usize,
        /// Bytes left in the datagram.
        available: usize,
    },

    /// Header could not be decoded.
    #[error("malformed segment: {0}")]
    Proto(#[from] ProtoError),
}

impl EngineError {
    /// Returns true if the error was caused by bytes received from the wire.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::ConversationMismatch { .. } | Self::LengthMismatch { .. } | Self::Proto(_)
        )
    }
}

/// Outcomes of `recv` that carry no message.
///
/// None of these are failures of the engine; they tell the caller why
/// nothing was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    /// Nothing queued for the application.
    #[error("no data queued")]
    Empty,

    /// The head message is still missing fragments.
    #[error("message incomplete")]
    Incomplete,

    /// Caller's buffer cannot hold the next message.
    #[error("buffer too small: need {needed} bytes")]
    BufferTooSmall {
        /// Size of the next message.
        needed: usize,
    },
}
