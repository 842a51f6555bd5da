//! The capturing packet sink.
//!
//! An [`Outbox`] is what an engine emits into. For every datagram it:
//!
//! 1. Counts the emission
//! 2. Consults the [`DropPolicy`] and discards matches
//! 3. Copies survivors into the [`OutputBuffer`], or records an overflow
//!
//! Drops and overflows are reported as separate counters and events; a full
//! buffer is never mistaken for injected loss.

use arqsim_core::PacketSink;
use arqsim_proto::{Segment, SequenceNumber, sequence_number};

use crate::{buffer::OutputBuffer, config::OverflowPolicy, drop_policy::DropPolicy, endpoint::Side};

/// Fate of one emitted datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored for the next dispatch.
    Buffered,
    /// Discarded by the drop policy.
    Dropped(SequenceNumber),
    /// Discarded because the buffer was full.
    Overflowed,
}

/// Something noteworthy that happened on a link, not yet time-stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Injected loss.
    Dropped(SequenceNumber),
    /// Buffer overflow; the sn is absent for sub-header datagrams.
    Overflowed(Option<SequenceNumber>),
}

/// Per-link totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounters {
    /// Datagrams accepted into the buffer.
    pub sent: u64,
    /// Datagrams discarded by the drop policy.
    pub dropped: u64,
    /// Datagrams discarded by a full buffer.
    pub overflowed: u64,
}

impl LinkCounters {
    /// Every datagram the engine emitted, whatever its fate.
    pub fn emitted(&self) -> u64 {
        self.sent + self.dropped + self.overflowed
    }
}

/// Packet sink owned by an engine.
#[derive(Debug)]
pub struct Outbox {
    side: Side,
    buffer: OutputBuffer,
    drop_policy: DropPolicy,
    overflow: OverflowPolicy,
    counters: LinkCounters,
    emitted_in_tick: u32,
    events: Vec<LinkEvent>,
}

impl Outbox {
    /// Create an outbox for `side`.
    pub fn new(
        side: Side,
        buffer: OutputBuffer,
        drop_policy: DropPolicy,
        overflow: OverflowPolicy,
    ) -> Self {
        Self {
            side,
            buffer,
            drop_policy,
            overflow,
            counters: LinkCounters::default(),
            emitted_in_tick: 0,
            events: Vec::new(),
        }
    }

    /// Capture one datagram.
    pub fn record(&mut self, datagram: &[u8]) -> RecordOutcome {
        self.emitted_in_tick = self.emitted_in_tick.saturating_add(1);

        let sn = sequence_number(datagram);
        if let Some(sn) = sn
            && self.drop_policy.check(Some(sn))
        {
            self.counters.dropped += 1;
            self.events.push(LinkEvent::Dropped(sn));
            tracing::debug!(side = %self.side, sn, "drop");
            return RecordOutcome::Dropped(sn);
        }

        match self.buffer.push(Segment::copy_from_slice(datagram)) {
            Ok(()) => {
                self.counters.sent += 1;
                RecordOutcome::Buffered
            },
            Err(rejected) => {
                self.counters.overflowed += 1;
                self.events.push(LinkEvent::Overflowed(sn));
                tracing::warn!(
                    side = %self.side,
                    capacity = rejected.capacity,
                    ?sn,
                    "output buffer full"
                );
                RecordOutcome::Overflowed
            },
        }
    }

    /// Remove every buffered segment, oldest first.
    pub fn take_segments(&mut self) -> Vec<Segment> {
        self.buffer.take_all()
    }

    /// Remove the link events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<LinkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Emissions since the last call, then reset the tick counter.
    pub fn take_emitted_in_tick(&mut self) -> u32 {
        std::mem::take(&mut self.emitted_in_tick)
    }

    /// Side this outbox belongs to.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Running totals.
    pub fn counters(&self) -> LinkCounters {
        self.counters
    }

    /// The bounded buffer.
    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    /// The loss schedule and its cursor.
    pub fn drop_policy(&self) -> &DropPolicy {
        &self.drop_policy
    }

    /// Overflow handling for this link.
    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }
}

impl PacketSink for Outbox {
    fn output(&mut self, datagram: &[u8]) {
        let _ = self.record(datagram);
    }
}
