//! Bounded per-endpoint output queue.

use arqsim_proto::Segment;
use thiserror::Error;

/// Insertion refused because the buffer is full.
///
/// Carries the rejected segment back so the caller decides whether losing
/// it is expected or fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("output buffer full ({capacity} segments)")]
pub struct CapacityExceeded {
    /// Configured capacity.
    pub capacity: usize,
    /// The segment that did not fit.
    pub segment: Segment,
}

/// FIFO of captured segments with a hard capacity.
///
/// # Invariants
///
/// - `len() <= capacity()` at all times
/// - Segments come out in insertion order
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    segments: Vec<Segment>,
    capacity: usize,
}

impl OutputBuffer {
    /// Create an empty buffer holding at most `capacity` segments.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { segments: Vec::new(), capacity }
    }

    /// Append a segment, or hand it back if the buffer is full.
    pub fn push(&mut self, segment: Segment) -> Result<(), CapacityExceeded> {
        if self.is_full() {
            return Err(CapacityExceeded { capacity: self.capacity, segment });
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Remove and return everything, oldest first.
    pub fn take_all(&mut self) -> Vec<Segment> {
        std::mem::take(&mut self.segments)
    }

    /// Number of buffered segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if the next push would be rejected.
    pub fn is_full(&self) -> bool {
        self.segments.len() >= self.capacity
    }

    /// Maximum number of segments.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Borrow the buffered segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(tag: u8) -> Segment {
        Segment::copy_from_slice(&[tag; 24])
    }

    #[test]
    fn rejects_beyond_capacity() {
        let mut buffer = OutputBuffer::with_capacity(2);
        buffer.push(seg(1)).unwrap();
        buffer.push(seg(2)).unwrap();

        let err = buffer.push(seg(3)).unwrap_err();
        assert_eq!(err.capacity, 2);
        assert_eq!(err.segment, seg(3));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn take_all_preserves_order_and_empties() {
        let mut buffer = OutputBuffer::with_capacity(4);
        for tag in 0..3 {
            buffer.push(seg(tag)).unwrap();
        }

        let drained = buffer.take_all();
        assert_eq!(drained, vec![seg(0), seg(1), seg(2)]);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
    }
}
