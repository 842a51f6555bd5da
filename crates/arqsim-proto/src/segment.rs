//! Opaque datagrams as seen by the simulated channel.

use bytes::Bytes;

use crate::header::SN_OFFSET;

/// Per-segment ordering identifier.
pub type SequenceNumber = u32;

/// Read the sequence number of the first segment in a datagram.
///
/// Returns `None` if the datagram is too short to carry one. This is the
/// only header field the harness is allowed to inspect.
pub fn sequence_number(datagram: &[u8]) -> Option<SequenceNumber> {
    let raw = datagram.get(SN_OFFSET..SN_OFFSET + 4)?;
    let bytes: [u8; 4] = raw.try_into().ok()?;
    Some(SequenceNumber::from_le_bytes(bytes))
}

/// One serialized datagram produced by the engine.
///
/// Immutable once captured. Cloning is cheap (reference counted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    bytes: Bytes,
}

impl Segment {
    /// Take an owned copy of `datagram`.
    pub fn copy_from_slice(datagram: &[u8]) -> Self {
        Self { bytes: Bytes::copy_from_slice(datagram) }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length datagram.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sequence number of the leading segment, if present.
    pub fn sequence_number(&self) -> Option<SequenceNumber> {
        sequence_number(&self.bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl From<Bytes> for Segment {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for Segment {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
