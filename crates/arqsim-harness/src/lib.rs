//! Deterministic simulation harness for the arqsim engine.
//!
//! Two engines talk to each other without sockets. Every datagram an engine
//! emits lands in its endpoint's bounded [`OutputBuffer`], possibly after
//! being discarded by the endpoint's [`DropPolicy`]; the harness then
//! delivers whole buffers to the peer, one dispatch round at a time, on a
//! virtual clock.
//!
//! ## Architecture
//!
//! ```text
//! Simulation (owns both endpoints and the clock)
//!   ├─ Endpoint A ── ControlBlock ── Outbox { DropPolicy, OutputBuffer }
//!   ├─ Endpoint B ── ControlBlock ── Outbox { DropPolicy, OutputBuffer }
//!   ├─ dispatch(A → B), dispatch(B → A)
//!   └─ Verifier (byte-exact payload check)
//! ```
//!
//! ## Per-tick order
//!
//! 1. Send: while budget remains, `send` one payload on A and flush it
//! 2. Dispatch: `dispatch(A, now)` then `dispatch(B, now)`
//! 3. Receive: try one `recv` on B and verify what comes out
//! 4. Advance the clock
//!
//! Execution is single-threaded and synchronous; the same [`SimConfig`]
//! always yields the same [`SimulationReport`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod drop_policy;
pub mod endpoint;
pub mod error;
pub mod outbox;
pub mod report;
pub mod simulation;
pub mod tracer;
pub mod verifier;

pub use buffer::{CapacityExceeded, OutputBuffer};
pub use clock::VirtualClock;
pub use config::{AckFlush, ConfigError, EndpointConfig, OverflowPolicy, SimConfig};
pub use dispatch::dispatch;
pub use drop_policy::DropPolicy;
pub use endpoint::{Endpoint, SimEndpoint, Side};
pub use error::HarnessError;
pub use outbox::{LinkCounters, LinkEvent, Outbox, RecordOutcome};
pub use report::{SimEvent, SimulationReport, TickStats};
pub use simulation::{ReceiveOutcome, Simulation, TickOutcome};
pub use tracer::TracingTracer;
pub use verifier::{Verifier, payload, verify};
