//! Reliable, ordered, congestion-controlled ARQ engine.
//!
//! The engine is Sans-IO: it never touches a socket or a clock. The caller
//! feeds it received datagrams ([`Engine::input`]) and the current time
//! ([`Engine::update`]); the engine hands outgoing datagrams to an injected
//! [`PacketSink`] capability, synchronously, from inside `flush`/`update`.
//!
//! ```text
//!   send ──► snd_queue ──(cwnd)──► snd_buf ──flush──► PacketSink
//!                                     ▲
//!                                   acks
//!   input ──► rcv_buf ──(in order)──► rcv_queue ──► recv
//! ```
//!
//! # Invariants
//!
//! - `snd_una <= snd_nxt` (wrapping), `snd_buf` is sorted by `sn`
//! - Data handed out by `recv` is exactly the bytes passed to `send`, in
//!   order, once
//! - The congestion window never drops below one segment

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod sink;

pub use config::NoDelayConfig;
pub use control::ControlBlock;
pub use engine::{CongestionSnapshot, Engine};
pub use error::{EngineError, RecvError};
pub use sink::{LogMask, PacketSink, Tracer};
