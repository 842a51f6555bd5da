//! The narrow interface a driver uses to operate an engine.

use crate::{
    error::{EngineError, RecvError},
    sink::PacketSink,
};

/// Read-only view of congestion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CongestionSnapshot {
    /// Clock value of the last `update`.
    pub current: u32,
    /// Oldest unacknowledged sequence number.
    pub snd_una: u32,
    /// Next sequence number to assign.
    pub snd_nxt: u32,
    /// Raw congestion window.
    pub cwnd: u32,
    /// `min(snd_wnd, rmt_wnd, cwnd)`; `cwnd` is skipped without congestion
    /// control.
    pub effective_cwnd: u32,
    /// Slow-start threshold.
    pub ssthresh: u32,
    /// Byte-granular window growth accumulator.
    pub incr: u32,
    /// Current retransmission timeout.
    pub rx_rto: u32,
    /// Total retransmissions so far.
    pub xmit_total: u32,
}

/// Operations a driver (the simulation harness, or a real socket loop)
/// needs from an engine.
///
/// Output leaves through [`Engine::Sink`], which the engine owns.
pub trait Engine {
    /// Sink receiving outgoing datagrams.
    type Sink: PacketSink;

    /// Conversation id.
    fn conv(&self) -> u32;

    /// Queue one application message. It is segmented on the next flush.
    fn send(&mut self, payload: &[u8]) -> Result<(), EngineError>;

    /// Emit pending acks, probes and any data the windows allow, now.
    fn flush(&mut self);

    /// Periodic maintenance at time `current` (ms). May flush.
    fn update(&mut self, current: u32);

    /// Feed one received datagram.
    fn input(&mut self, datagram: &[u8]) -> Result<(), EngineError>;

    /// Copy the next complete message into `buf`, returning its length.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecvError>;

    /// Size of the next complete message.
    fn peek_size(&self) -> Result<usize, RecvError>;

    /// Acks accumulated since the last flush.
    fn pending_acks(&self) -> usize;

    /// Segments queued or in flight.
    fn wait_snd(&self) -> usize;

    /// Snapshot congestion state.
    fn congestion(&self) -> CongestionSnapshot;

    /// Borrow the sink.
    fn sink(&self) -> &Self::Sink;

    /// Mutably borrow the sink.
    fn sink_mut(&mut self) -> &mut Self::Sink;
}
