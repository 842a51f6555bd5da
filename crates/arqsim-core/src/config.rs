//! Tuning knobs and protocol constants.

/// Minimum RTO when nodelay is enabled (ms).
pub const RTO_NODELAY: u32 = 30;
/// Minimum RTO in normal mode (ms).
pub const RTO_MIN: u32 = 100;
/// Initial RTO before any RTT sample (ms).
pub const RTO_DEFAULT: u32 = 200;
/// Upper bound for RTO (ms).
pub const RTO_MAX: u32 = 60_000;

/// Default send window (segments).
pub const WND_SND: u32 = 32;
/// Default and minimum receive window (segments).
pub const WND_RCV: u32 = 128;

/// Default MTU (bytes).
pub const MTU_DEFAULT: usize = 1400;
/// Smallest MTU accepted by [`crate::ControlBlock::set_mtu`].
pub const MTU_MIN: usize = 50;
/// Largest MTU accepted by [`crate::ControlBlock::set_mtu`].
pub const MTU_MAX: usize = 65_535;

/// Default flush interval (ms).
pub const INTERVAL: u32 = 100;
/// Interval clamp.
pub const INTERVAL_MIN: u32 = 10;
/// Interval clamp.
pub const INTERVAL_MAX: u32 = 5000;

/// Transmissions after which the link is considered dead.
pub const DEAD_LINK: u32 = 20;

/// Initial slow-start threshold.
pub const THRESH_INIT: u32 = 2;
/// Floor for the slow-start threshold after loss.
pub const THRESH_MIN: u32 = 2;

/// First window probe wait (ms).
pub const PROBE_INIT: u32 = 7000;
/// Window probe wait cap (ms).
pub const PROBE_LIMIT: u32 = 120_000;

/// Maximum fast retransmissions per segment.
pub const FASTACK_LIMIT: u32 = 5;

/// Clock jumps larger than this resynchronise the flush schedule.
pub const CLOCK_JUMP: i32 = 10_000;

/// Retransmission and congestion tuning.
///
/// Mirrors the four knobs of the classic `nodelay(nodelay, interval, resend,
/// nc)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoDelayConfig {
    /// 0 disables nodelay; 1 enables it; 2 uses the smoothed RTO for backoff.
    pub nodelay: u32,
    /// Internal flush interval in ms, clamped to `10..=5000`.
    pub interval: u32,
    /// Duplicate-ack count that triggers fast retransmit (0 disables).
    pub resend: u32,
    /// Ignore the congestion window entirely.
    pub no_congestion_control: bool,
}

impl NoDelayConfig {
    /// Aggressive preset: nodelay, 10ms interval, fast resend on 2 dup-acks,
    /// no congestion control.
    pub fn turbo() -> Self {
        Self { nodelay: 1, interval: 10, resend: 2, no_congestion_control: true }
    }
}

impl Default for NoDelayConfig {
    fn default() -> Self {
        Self { nodelay: 0, interval: INTERVAL, resend: 0, no_congestion_control: false }
    }
}
