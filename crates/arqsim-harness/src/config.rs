//! Simulation configuration.
//!
//! Every knob is read once, when the [`Simulation`](crate::Simulation) and its
//! endpoints are built. Defaults reproduce the classic two-peer scenario:
//! 128 MSS-sized messages from A to B, 100 ms ticks, no loss.

use arqsim_core::{
    LogMask, NoDelayConfig,
    config::{MTU_DEFAULT, MTU_MAX, MTU_MIN, WND_RCV, WND_SND},
};
use arqsim_proto::{HEADER_SIZE, SequenceNumber};
use thiserror::Error;

use crate::DropPolicy;

/// Default output buffer capacity per endpoint.
pub const BUFFER_CAPACITY: usize = 4096;

/// Default per-tick advance of the virtual clock.
pub const TICK_INCREMENT: u32 = 100;

/// Default number of messages A sends.
pub const TOTAL_SENDS: u32 = 128;

/// Default tick budget before a run is declared stalled.
pub const MAX_TICKS: u64 = 100_000;

/// Initial slow-start threshold the sender starts with.
pub const SENDER_SSTHRESH: u32 = 2;

/// Largest fragment count a single message may need.
const FRAGMENT_LIMIT: usize = u8::MAX as usize + 1;

/// Configuration rejected before any engine is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// MTU cannot hold a header plus payload.
    #[error("mtu {mtu} below minimum {min}")]
    MtuTooSmall {
        /// Requested MTU
        mtu: usize,
        /// Engine minimum
        min: usize,
    },

    /// MTU larger than the engine supports.
    #[error("mtu {mtu} above maximum {max}")]
    MtuTooLarge {
        /// Requested MTU
        mtu: usize,
        /// Engine maximum
        max: usize,
    },

    /// Zero-length messages cannot be sent.
    #[error("payload size must be positive")]
    EmptyPayload,

    /// Message would need more fragments than the receiver can reassemble.
    #[error("payload of {size} bytes needs {fragments} fragments, limit {limit}")]
    PayloadTooLarge {
        /// Payload size
        size: usize,
        /// Fragments required at the sender's MSS
        fragments: usize,
        /// Largest acceptable count (exclusive)
        limit: usize,
    },

    /// Output buffer must hold at least one segment.
    #[error("output buffer capacity must be positive")]
    ZeroCapacity,

    /// Clock must move forward.
    #[error("tick increment must be positive")]
    ZeroTickIncrement,

    /// Nothing to send.
    #[error("total sends must be positive")]
    ZeroSends,

    /// Runs need at least one tick.
    #[error("max ticks must be positive")]
    ZeroMaxTicks,
}

/// How the receiving side's delayed acks are flushed during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckFlush {
    /// One flush after the whole batch is delivered.
    #[default]
    Batched,
    /// A flush after every delivered segment.
    PerSegment,
}

/// What happens when an endpoint's output buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Discard the segment and count it as an overflow.
    #[default]
    Discard,
    /// Abort the run with
    /// [`HarnessError::BufferOverflow`](crate::HarnessError::BufferOverflow).
    Fatal,
}

/// Per-endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Maximum datagram size.
    pub mtu: usize,
    /// Send window in segments.
    pub send_window: u32,
    /// Receive window in segments.
    pub recv_window: u32,
    /// Retransmission tuning.
    pub nodelay: NoDelayConfig,
    /// Slow-start threshold override, applied after construction.
    pub initial_ssthresh: Option<u32>,
    /// Sequence numbers to discard on this endpoint's outgoing link, in order.
    pub drop_targets: Vec<SequenceNumber>,
    /// Output buffer capacity in segments.
    pub buffer_capacity: usize,
    /// Behavior on a full output buffer.
    pub overflow: OverflowPolicy,
    /// Engine trace categories forwarded to `tracing`. Empty disables tracing.
    pub log_mask: LogMask,
}

impl EndpointConfig {
    /// Largest payload a single segment carries.
    pub fn mss(&self) -> usize {
        self.mtu.saturating_sub(HEADER_SIZE)
    }

    /// Replace the drop targets.
    pub fn with_drop_targets(
        mut self,
        targets: impl IntoIterator<Item = SequenceNumber>,
    ) -> Self {
        self.drop_targets = targets.into_iter().collect();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mtu < MTU_MIN {
            return Err(ConfigError::MtuTooSmall { mtu: self.mtu, min: MTU_MIN });
        }
        if self.mtu > MTU_MAX {
            return Err(ConfigError::MtuTooLarge { mtu: self.mtu, max: MTU_MAX });
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            mtu: MTU_DEFAULT,
            send_window: WND_SND,
            recv_window: WND_RCV,
            nodelay: NoDelayConfig::default(),
            initial_ssthresh: None,
            drop_targets: Vec::new(),
            buffer_capacity: BUFFER_CAPACITY,
            overflow: OverflowPolicy::Discard,
            log_mask: LogMask::all() & !LogMask::RECV,
        }
    }
}

/// Whole-run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Conversation id shared by both endpoints.
    pub conv: u32,
    /// Bytes per application message.
    pub payload_size: usize,
    /// Messages A sends in total.
    pub total_sends: u32,
    /// Virtual milliseconds per tick.
    pub tick_increment: u32,
    /// Receive attempts before this time are skipped.
    pub recv_start_time: u32,
    /// Tick budget before [`HarnessError::Stalled`](crate::HarnessError::Stalled).
    pub max_ticks: u64,
    /// Delayed-ack flushing during dispatch.
    pub ack_flush: AckFlush,
    /// Sender.
    pub a: EndpointConfig,
    /// Receiver.
    pub b: EndpointConfig,
}

impl SimConfig {
    /// A single 4096-byte message over a tiny, strict buffer.
    pub fn single_transfer() -> Self {
        let strict = EndpointConfig {
            buffer_capacity: 4,
            overflow: OverflowPolicy::Fatal,
            ..EndpointConfig::default()
        };
        Self {
            payload_size: 4096,
            total_sends: 1,
            a: EndpointConfig { initial_ssthresh: Some(SENDER_SSTHRESH), ..strict.clone() },
            b: strict,
            ..Self::default()
        }
    }

    /// Discard these sequence numbers on A's outgoing link.
    pub fn with_drop_targets(
        mut self,
        targets: impl IntoIterator<Item = SequenceNumber>,
    ) -> Self {
        self.a = self.a.with_drop_targets(targets);
        self
    }

    /// Discard `count` distinct sequence numbers below `max_sn` on A's
    /// outgoing link, chosen by [`DropPolicy::seeded`].
    pub fn with_seeded_drops(self, seed: u64, count: usize, max_sn: SequenceNumber) -> Self {
        let policy = DropPolicy::seeded(seed, count, max_sn);
        self.with_drop_targets(policy.targets().iter().copied())
    }

    /// Set the number of messages.
    pub fn with_total_sends(mut self, total_sends: u32) -> Self {
        self.total_sends = total_sends;
        self
    }

    /// Set the message size.
    pub fn with_payload_size(mut self, payload_size: usize) -> Self {
        self.payload_size = payload_size;
        self
    }

    /// Set the tick budget.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Set the delayed-ack flushing policy.
    pub fn with_ack_flush(mut self, ack_flush: AckFlush) -> Self {
        self.ack_flush = ack_flush;
        self
    }

    /// Check every constraint the harness relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.a.validate()?;
        self.b.validate()?;

        if self.payload_size == 0 {
            return Err(ConfigError::EmptyPayload);
        }
        // the sender checks against its own window, the receiver against its own
        let fragments = self.payload_size.div_ceil(self.a.mss());
        let limit = [self.a.recv_window, self.b.recv_window]
            .into_iter()
            .map(|window| window.max(WND_RCV) as usize)
            .fold(FRAGMENT_LIMIT, usize::min);
        if fragments >= limit {
            return Err(ConfigError::PayloadTooLarge {
                size: self.payload_size,
                fragments,
                limit,
            });
        }
        if self.tick_increment == 0 {
            return Err(ConfigError::ZeroTickIncrement);
        }
        if self.total_sends == 0 {
            return Err(ConfigError::ZeroSends);
        }
        if self.max_ticks == 0 {
            return Err(ConfigError::ZeroMaxTicks);
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        let a = EndpointConfig {
            initial_ssthresh: Some(SENDER_SSTHRESH),
            ..EndpointConfig::default()
        };
        Self {
            conv: 0x1122_3344,
            payload_size: a.mss(),
            total_sends: TOTAL_SENDS,
            tick_increment: TICK_INCREMENT,
            recv_start_time: 0,
            max_ticks: MAX_TICKS,
            ack_flush: AckFlush::Batched,
            a,
            b: EndpointConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert_eq!(config.payload_size, 1376);
        assert_eq!(config.a.initial_ssthresh, Some(2));
        assert_eq!(config.b.initial_ssthresh, None);
        assert!(config.validate().is_ok());
        assert!(SimConfig::single_transfer().validate().is_ok());
    }

    #[test]
    fn rejects_small_mtu() {
        let mut config = SimConfig::default();
        config.b.mtu = 49;
        assert_eq!(config.validate(), Err(ConfigError::MtuTooSmall { mtu: 49, min: 50 }));
    }

    #[test]
    fn rejects_large_mtu() {
        let mut config = SimConfig::default();
        config.a.mtu = 70_000;
        config.b.mtu = 70_000;
        assert_eq!(config.validate(), Err(ConfigError::MtuTooLarge { mtu: 70_000, max: MTU_MAX }));

        config.a.mtu = MTU_MAX;
        config.b.mtu = MTU_MAX;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_sized_knobs() {
        let config = SimConfig::default();
        assert_eq!(config.clone().with_payload_size(0).validate(), Err(ConfigError::EmptyPayload));
        assert_eq!(config.clone().with_total_sends(0).validate(), Err(ConfigError::ZeroSends));
        assert_eq!(config.with_max_ticks(0).validate(), Err(ConfigError::ZeroMaxTicks));

        let mut config = SimConfig::default();
        config.tick_increment = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickIncrement));

        config = SimConfig::default();
        config.a.buffer_capacity = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn rejects_payload_beyond_fragment_limit() {
        let config = SimConfig::default().with_payload_size(1376 * 128);
        assert_eq!(
            config.validate(),
            Err(ConfigError::PayloadTooLarge { size: 1376 * 128, fragments: 128, limit: 128 })
        );

        // a wider receive window on B does not lift the sender's own limit
        let mut config = SimConfig::default().with_payload_size(1376 * 200);
        config.b.recv_window = 256;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PayloadTooLarge { size: 1376 * 200, fragments: 200, limit: 128 })
        );

        config.a.recv_window = 256;
        config.b.recv_window = WND_RCV;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PayloadTooLarge { size: 1376 * 200, fragments: 200, limit: 128 })
        );

        config.b.recv_window = 256;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn drop_targets_apply_to_sender() {
        let config = SimConfig::default().with_drop_targets([3, 7]);
        assert_eq!(config.a.drop_targets, vec![3, 7]);
        assert!(config.b.drop_targets.is_empty());
    }

    #[test]
    fn seeded_drops_are_reproducible() {
        let config = SimConfig::default().with_seeded_drops(7, 5, 64);
        assert_eq!(config.a.drop_targets, DropPolicy::seeded(7, 5, 64).targets());
        assert_eq!(config, SimConfig::default().with_seeded_drops(7, 5, 64));
        assert!(config.b.drop_targets.is_empty());
    }
}
