//! The clock-driven loop.
//!
//! Each tick runs three phases in a fixed order and then advances the
//! virtual clock, whatever happened:
//!
//! ```text
//! Send ──► Dispatch A→B ──► (tick stats) ──► Dispatch B→A ──► Receive ──► advance
//! ```
//!
//! # Invariants
//!
//! - A's traffic reaches B before B's own maintenance round in the same tick
//! - At most one application send and one receive attempt per tick
//! - The run ends successfully exactly when the verified count reaches the
//!   configured send count; running out of ticks first is a stall

use arqsim_core::{ControlBlock, Engine, RecvError};

use crate::{
    clock::VirtualClock,
    config::SimConfig,
    dispatch::dispatch,
    endpoint::{Endpoint, SimEndpoint, Side},
    error::HarnessError,
    outbox::{LinkEvent, Outbox},
    report::{SimEvent, SimulationReport, TickStats},
    verifier::{Verifier, payload},
};

/// Result of one receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Clock has not reached `recv_start_time`; nothing was requested.
    Skipped,
    /// Receiver holds no data.
    NoData,
    /// Head message is still missing fragments.
    Incomplete,
    /// A message arrived and matched; carries its zero-based index.
    Completed(u32),
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// More messages are outstanding.
    Running(ReceiveOutcome),
    /// Every message has been verified.
    Finished,
}

/// Two endpoints, a clock and a verifier.
#[derive(Debug)]
pub struct Simulation<E = ControlBlock<Outbox>> {
    config: SimConfig,
    a: Endpoint<E>,
    b: Endpoint<E>,
    clock: VirtualClock,
    verifier: Verifier,
    sends_issued: u32,
    recv_buf: Vec<u8>,
    report: SimulationReport,
}

impl Simulation {
    /// Validate `config` and build both endpoints from it.
    pub fn new(config: SimConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        let a = SimEndpoint::from_config(Side::A, config.conv, &config.a)?;
        let b = SimEndpoint::from_config(Side::B, config.conv, &config.b)?;
        Self::with_endpoints(config, a, b)
    }
}

impl<E: Engine<Sink = Outbox>> Simulation<E> {
    /// Drive caller-built endpoints with the loop settings of `config`.
    pub fn with_endpoints(
        config: SimConfig,
        a: Endpoint<E>,
        b: Endpoint<E>,
    ) -> Result<Self, HarnessError> {
        config.validate()?;
        let expected = payload(config.payload_size);
        Ok(Self {
            clock: VirtualClock::new(config.tick_increment),
            verifier: Verifier::new(expected),
            sends_issued: 0,
            recv_buf: vec![0u8; config.payload_size],
            report: SimulationReport::default(),
            config,
            a,
            b,
        })
    }

    /// Run ticks until every message is verified.
    ///
    /// # Errors
    ///
    /// Any harness-fatal condition, or [`HarnessError::Stalled`] once
    /// `max_ticks` ticks pass without completion.
    pub fn run(mut self) -> Result<SimulationReport, HarnessError> {
        tracing::info!(
            sends = self.config.total_sends,
            payload = self.config.payload_size,
            drop_targets_a = self.config.a.drop_targets.len(),
            drop_targets_b = self.config.b.drop_targets.len(),
            "simulation starting"
        );

        loop {
            if self.clock.ticks() >= self.config.max_ticks {
                return Err(HarnessError::Stalled {
                    ticks: self.clock.ticks(),
                    completed: self.verifier.verified(),
                    expected: self.config.total_sends,
                });
            }
            if self.step()? == TickOutcome::Finished {
                break;
            }
        }

        let report = self.report;
        tracing::info!(
            ticks = report.ticks,
            finish_time = report.finish_time,
            completed = report.completed,
            dropped_a = report.a.dropped,
            dropped_b = report.b.dropped,
            overflowed = report.a.overflowed + report.b.overflowed,
            timeouts = report.timeouts,
            "simulation complete"
        );
        Ok(report)
    }

    /// Execute one tick.
    pub fn step(&mut self) -> Result<TickOutcome, HarnessError> {
        let now = self.clock.now();
        let ack_flush = self.config.ack_flush;

        if self.sends_issued < self.config.total_sends {
            self.a.send(self.verifier.expected())?;
            self.sends_issued += 1;
        }
        self.collect_link_events(now);

        let delivered = dispatch(&mut self.a, &mut self.b, now, ack_flush)?;
        self.record_delivery(now, Side::A, delivered);
        self.record_tick(now);

        let delivered = dispatch(&mut self.b, &mut self.a, now, ack_flush)?;
        self.record_delivery(now, Side::B, delivered);

        let received = self.receive(now)?;
        self.clock.advance();
        self.refresh_report();

        if self.verifier.verified() >= self.config.total_sends {
            self.report.finish_time = now;
            return Ok(TickOutcome::Finished);
        }
        Ok(TickOutcome::Running(received))
    }

    fn receive(&mut self, now: u32) -> Result<ReceiveOutcome, HarnessError> {
        if now < self.config.recv_start_time {
            return Ok(ReceiveOutcome::Skipped);
        }

        match self.b.recv(&mut self.recv_buf) {
            Ok(len) => {
                let index = self.verifier.verified();
                self.verifier.check(&self.recv_buf[..len])?;
                self.report.events.push(SimEvent::Completed { time: now, index });
                tracing::debug!(t = now, index, len, "message verified");
                Ok(ReceiveOutcome::Completed(index))
            },
            Err(RecvError::Empty) => Ok(ReceiveOutcome::NoData),
            Err(RecvError::Incomplete) => Ok(ReceiveOutcome::Incomplete),
            Err(RecvError::BufferTooSmall { needed }) => Err(HarnessError::LengthMismatch {
                expected: self.verifier.expected().len(),
                actual: needed,
            }),
        }
    }

    fn record_tick(&mut self, now: u32) {
        let emitted = self.a.outbox_mut().take_emitted_in_tick();
        let row = TickStats::from_snapshot(now, emitted, &self.a.congestion());
        tracing::debug!(
            t = row.time,
            n = row.emitted,
            una = row.snd_una,
            nxt = row.snd_nxt,
            cwnd = row.effective_cwnd,
            raw = row.cwnd,
            ssthresh = row.ssthresh,
            incr = row.incr,
            "tick"
        );
        self.report.tick_stats.push(row);
    }

    fn record_delivery(&mut self, now: u32, from: Side, segments: usize) {
        self.collect_link_events(now);
        if segments > 0 {
            self.report.events.push(SimEvent::Delivered { time: now, from, segments });
        }
    }

    fn collect_link_events(&mut self, now: u32) {
        for endpoint in [&mut self.a, &mut self.b] {
            let side = endpoint.side();
            for event in endpoint.outbox_mut().take_events() {
                self.report.events.push(match event {
                    LinkEvent::Dropped(sn) => SimEvent::Dropped { time: now, side, sn },
                    LinkEvent::Overflowed(sn) => SimEvent::Overflowed { time: now, side, sn },
                });
            }
        }
    }

    fn refresh_report(&mut self) {
        self.report.ticks = self.clock.ticks();
        self.report.completed = self.verifier.verified();
        self.report.a = self.a.outbox().counters();
        self.report.b = self.b.outbox().counters();
        self.report.timeouts = self.a.congestion().xmit_total;
    }

    /// Sender endpoint.
    pub fn a(&self) -> &Endpoint<E> {
        &self.a
    }

    /// Receiver endpoint.
    pub fn b(&self) -> &Endpoint<E> {
        &self.b
    }

    /// Virtual clock.
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Messages verified so far.
    pub fn completed(&self) -> u32 {
        self.verifier.verified()
    }

    /// Report accumulated so far.
    pub fn report(&self) -> &SimulationReport {
        &self.report
    }

    /// Loop settings.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
