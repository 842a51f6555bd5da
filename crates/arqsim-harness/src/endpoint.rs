//! One side of the simulated conversation.
//!
//! An [`Endpoint`] pairs a side label with an engine whose sink is an
//! [`Outbox`]. The endpoint never references its peer; the
//! [`Simulation`](crate::Simulation) owns both and passes them to
//! [`dispatch`](crate::dispatch) explicitly.

use std::fmt;

use arqsim_core::{CongestionSnapshot, ControlBlock, Engine, EngineError, RecvError};
use arqsim_proto::Segment;

use crate::{
    buffer::OutputBuffer,
    config::{ConfigError, EndpointConfig, OverflowPolicy},
    drop_policy::DropPolicy,
    error::HarnessError,
    outbox::Outbox,
    tracer::TracingTracer,
};

/// Which end of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The sender.
    A,
    /// The receiver.
    B,
}

impl Side {
    /// The other end.
    pub fn peer(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Endpoint backed by the stock control block.
pub type SimEndpoint = Endpoint<ControlBlock<Outbox>>;

/// Engine plus its capture state.
#[derive(Debug)]
pub struct Endpoint<E> {
    side: Side,
    engine: E,
}

impl<E: Engine<Sink = Outbox>> Endpoint<E> {
    /// Wrap a configured engine and give it its initializing `update(0)`.
    pub fn new(side: Side, mut engine: E) -> Self {
        engine.update(0);
        Self { side, engine }
    }

    /// Side label.
    pub fn side(&self) -> Side {
        self.side
    }

    /// The engine, read-only.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine, for direct driving in tests.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Captured output.
    pub fn outbox(&self) -> &Outbox {
        self.engine.sink()
    }

    /// Captured output, mutably.
    pub fn outbox_mut(&mut self) -> &mut Outbox {
        self.engine.sink_mut()
    }

    /// Queue one application message and push it out immediately.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), HarnessError> {
        self.engine.send(payload).map_err(|source| HarnessError::Send { side: self.side, source })?;
        self.engine.flush();
        self.check_overflow()
    }

    /// Advance the engine's clock.
    pub fn update(&mut self, now: u32) {
        self.engine.update(now);
    }

    /// Flush pending acks, probes and data.
    pub fn flush(&mut self) {
        self.engine.flush();
    }

    /// Deliver one segment from the peer.
    pub fn input(&mut self, segment: &Segment) -> Result<(), HarnessError> {
        self.engine
            .input(segment.as_bytes())
            .map_err(|source| HarnessError::Input { side: self.side, source })
    }

    /// Take the next complete message.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecvError> {
        self.engine.recv(buf)
    }

    /// Acks waiting to be flushed.
    pub fn pending_acks(&self) -> usize {
        self.engine.pending_acks()
    }

    /// Congestion counters.
    pub fn congestion(&self) -> CongestionSnapshot {
        self.engine.congestion()
    }

    /// Fail if the buffer has overflowed and the policy makes that fatal.
    pub fn check_overflow(&self) -> Result<(), HarnessError> {
        let outbox = self.outbox();
        if outbox.overflow_policy() == OverflowPolicy::Fatal && outbox.counters().overflowed > 0 {
            return Err(HarnessError::BufferOverflow {
                side: self.side,
                capacity: outbox.buffer().capacity(),
            });
        }
        Ok(())
    }
}

impl SimEndpoint {
    /// Build and initialize a control block from `config`.
    pub fn from_config(
        side: Side,
        conv: u32,
        config: &EndpointConfig,
    ) -> Result<Self, HarnessError> {
        let outbox = Outbox::new(
            side,
            OutputBuffer::with_capacity(config.buffer_capacity),
            DropPolicy::new(config.drop_targets.iter().copied()),
            config.overflow,
        );

        let mut engine = ControlBlock::new(conv, outbox);
        engine.set_nodelay(config.nodelay);
        engine.set_window(config.send_window, config.recv_window);
        engine.set_mtu(config.mtu).map_err(|err| match err {
            EngineError::InvalidMtu { mtu, min, .. } if mtu < min => {
                HarnessError::from(ConfigError::MtuTooSmall { mtu, min })
            },
            EngineError::InvalidMtu { mtu, max, .. } => {
                HarnessError::from(ConfigError::MtuTooLarge { mtu, max })
            },
            source => HarnessError::Send { side, source },
        })?;
        if let Some(ssthresh) = config.initial_ssthresh {
            engine.set_ssthresh(ssthresh);
        }
        if !config.log_mask.is_empty() {
            engine.set_tracer(Box::new(TracingTracer::new(side)), config.log_mask);
        }

        Ok(Self::new(side, engine))
    }
}
