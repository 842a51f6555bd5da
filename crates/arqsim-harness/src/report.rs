//! What a run produced.
//!
//! Two runs with identical configuration produce equal reports; the
//! determinism tests compare them with `==`.

use arqsim_core::CongestionSnapshot;
use arqsim_proto::SequenceNumber;

use crate::{endpoint::Side, outbox::LinkCounters};

/// Time-stamped harness event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Drop policy discarded a datagram.
    Dropped {
        /// Virtual time
        time: u32,
        /// Emitting side
        side: Side,
        /// Discarded sn
        sn: SequenceNumber,
    },
    /// Full buffer discarded a datagram.
    Overflowed {
        /// Virtual time
        time: u32,
        /// Emitting side
        side: Side,
        /// Discarded sn, if the datagram carried one
        sn: Option<SequenceNumber>,
    },
    /// A dispatch round moved segments.
    Delivered {
        /// Virtual time
        time: u32,
        /// Emitting side
        from: Side,
        /// Segments fed to the peer
        segments: usize,
    },
    /// A message was received and verified.
    Completed {
        /// Virtual time
        time: u32,
        /// Zero-based message index
        index: u32,
    },
}

/// Sender congestion state after its dispatch round, one row per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    /// Virtual time
    pub time: u32,
    /// Datagrams the sender emitted since the previous row
    pub emitted: u32,
    /// First unacknowledged sn
    pub snd_una: u32,
    /// Next sn to assign
    pub snd_nxt: u32,
    /// Window actually used
    pub effective_cwnd: u32,
    /// Raw congestion window
    pub cwnd: u32,
    /// Slow-start threshold
    pub ssthresh: u32,
    /// Congestion-avoidance byte accumulator
    pub incr: u32,
}

impl TickStats {
    /// Row from a congestion snapshot.
    pub fn from_snapshot(time: u32, emitted: u32, snapshot: &CongestionSnapshot) -> Self {
        Self {
            time,
            emitted,
            snd_una: snapshot.snd_una,
            snd_nxt: snapshot.snd_nxt,
            effective_cwnd: snapshot.effective_cwnd,
            cwnd: snapshot.cwnd,
            ssthresh: snapshot.ssthresh,
            incr: snapshot.incr,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    /// Ticks executed, including the final one.
    pub ticks: u64,
    /// Virtual time of the tick that verified the last message.
    pub finish_time: u32,
    /// Messages received and verified.
    pub completed: u32,
    /// Sender link totals.
    pub a: LinkCounters,
    /// Receiver link totals.
    pub b: LinkCounters,
    /// Sender retransmission timeouts.
    pub timeouts: u32,
    /// Everything noteworthy, in order.
    pub events: Vec<SimEvent>,
    /// One row per tick.
    pub tick_stats: Vec<TickStats>,
}

impl SimulationReport {
    /// Sequence numbers the drop policy discarded on `side`, in order.
    pub fn dropped_sns(&self, side: Side) -> Vec<SequenceNumber> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                SimEvent::Dropped { side: s, sn, .. } if s == side => Some(sn),
                _ => None,
            })
            .collect()
    }

    /// Times at which messages completed.
    pub fn completion_times(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                SimEvent::Completed { time, .. } => Some(time),
                _ => None,
            })
            .collect()
    }
}
