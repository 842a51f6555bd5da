//! Capabilities injected into the engine at construction.

use std::fmt;

use bitflags::bitflags;
use bytes::Bytes;

/// Destination for outgoing datagrams.
///
/// Called synchronously from `flush`/`update`, on the caller's stack, zero
/// or more times per call. Implementations must not call back into the
/// engine.
pub trait PacketSink {
    /// Take one datagram. The slice is only valid for the duration of the
    /// call.
    fn output(&mut self, datagram: &[u8]);
}

impl PacketSink for Vec<Bytes> {
    fn output(&mut self, datagram: &[u8]) {
        self.push(Bytes::copy_from_slice(datagram));
    }
}

bitflags! {
    /// Categories of engine diagnostics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LogMask: u32 {
        /// Datagram handed to the sink.
        const OUTPUT = 1;
        /// Datagram passed to `input`.
        const INPUT = 1 << 1;
        /// Fragment queued by `send`.
        const SEND = 1 << 2;
        /// Fragment handed out by `recv`.
        const RECV = 1 << 3;
        /// Data segment received.
        const IN_DATA = 1 << 4;
        /// Ack received.
        const IN_ACK = 1 << 5;
        /// Window probe received.
        const IN_PROBE = 1 << 6;
        /// Window size received.
        const IN_WINS = 1 << 7;
        /// Data segment sent.
        const OUT_DATA = 1 << 8;
        /// Ack sent.
        const OUT_ACK = 1 << 9;
        /// Window probe sent.
        const OUT_PROBE = 1 << 10;
        /// Window size sent.
        const OUT_WINS = 1 << 11;
    }
}

/// Human-readable diagnostics sink. Purely observational.
pub trait Tracer {
    /// Record one diagnostic line.
    fn trace(&mut self, kind: LogMask, current: u32, message: fmt::Arguments<'_>);
}
