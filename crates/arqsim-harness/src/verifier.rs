//! Byte-exact payload checking.

use bytes::Bytes;

use crate::error::HarnessError;

/// Deterministic fill pattern: byte `i` is `i % 255`.
pub fn payload(len: usize) -> Bytes {
    (0..len).map(|i| (i % 255) as u8).collect()
}

/// Compare a received message against the sent one.
///
/// Length is checked first; otherwise reports the first differing byte.
pub fn verify(sent: &[u8], received: &[u8]) -> Result<(), HarnessError> {
    if sent.len() != received.len() {
        return Err(HarnessError::LengthMismatch { expected: sent.len(), actual: received.len() });
    }
    match sent.iter().zip(received).position(|(s, r)| s != r) {
        Some(offset) => Err(HarnessError::ContentMismatch {
            offset,
            expected: sent[offset],
            actual: received[offset],
        }),
        None => Ok(()),
    }
}

/// Verifies every delivered message against the one expected payload.
#[derive(Debug, Clone)]
pub struct Verifier {
    expected: Bytes,
    verified: u32,
}

impl Verifier {
    /// Verifier expecting `expected` for every message.
    pub fn new(expected: Bytes) -> Self {
        Self { expected, verified: 0 }
    }

    /// Check one message; counts it on success.
    pub fn check(&mut self, received: &[u8]) -> Result<u32, HarnessError> {
        verify(&self.expected, received)?;
        self.verified += 1;
        Ok(self.verified)
    }

    /// Messages verified so far.
    pub fn verified(&self) -> u32 {
        self.verified
    }

    /// The payload every message must match.
    pub fn expected(&self) -> &Bytes {
        &self.expected
    }
}
