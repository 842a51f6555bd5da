//! Harness error types.

use arqsim_core::EngineError;
use thiserror::Error;

use crate::{config::ConfigError, endpoint::Side};

/// Reasons a simulation run stops early.
///
/// Every variant aborts the run. [`is_protocol_defect`](Self::is_protocol_defect)
/// separates engine misbehavior from a bad harness setup.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Peer rejected a delivered segment.
    #[error("endpoint {side} rejected a delivered segment: {source}")]
    Input {
        /// Receiving side
        side: Side,
        /// Engine's reason
        #[source]
        source: EngineError,
    },

    /// Engine refused an application message.
    #[error("endpoint {side} refused an application send: {source}")]
    Send {
        /// Sending side
        side: Side,
        /// Engine's reason
        #[source]
        source: EngineError,
    },

    /// Received message size differs from the sent one.
    #[error("length mismatch: sent {expected} bytes, received {actual}")]
    LengthMismatch {
        /// Bytes sent
        expected: usize,
        /// Bytes received
        actual: usize,
    },

    /// Received message differs from the sent one.
    #[error("content mismatch at byte {offset}: sent {expected:#04x}, received {actual:#04x}")]
    ContentMismatch {
        /// First differing byte
        offset: usize,
        /// Byte sent
        expected: u8,
        /// Byte received
        actual: u8,
    },

    /// Output buffer filled up under [`OverflowPolicy::Fatal`](crate::OverflowPolicy::Fatal).
    #[error("endpoint {side} output buffer overflowed ({capacity} segments)")]
    BufferOverflow {
        /// Overflowing side
        side: Side,
        /// Configured capacity
        capacity: usize,
    },

    /// Tick budget ran out before every message arrived.
    #[error("stalled after {ticks} ticks with {completed}/{expected} messages delivered")]
    Stalled {
        /// Ticks executed
        ticks: u64,
        /// Messages verified
        completed: u32,
        /// Messages expected
        expected: u32,
    },

    /// Configuration rejected before the run started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl HarnessError {
    /// True if the engine misbehaved, as opposed to the harness being
    /// misconfigured or undersized.
    pub fn is_protocol_defect(&self) -> bool {
        match self {
            Self::Input { .. } | Self::LengthMismatch { .. } | Self::ContentMismatch { .. } => true,
            Self::Stalled { .. } => true,
            Self::Send { .. } | Self::BufferOverflow { .. } | Self::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let mismatch = HarnessError::ContentMismatch { offset: 3, expected: 1, actual: 2 };
        assert!(mismatch.is_protocol_defect());
        assert_eq!(mismatch.to_string(), "content mismatch at byte 3: sent 0x01, received 0x02");

        let overflow = HarnessError::BufferOverflow { side: Side::A, capacity: 4 };
        assert!(!overflow.is_protocol_defect());
        assert_eq!(overflow.to_string(), "endpoint A output buffer overflowed (4 segments)");

        let config = HarnessError::from(ConfigError::ZeroSends);
        assert!(!config.is_protocol_defect());
    }
}
