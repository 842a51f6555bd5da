//! Bridge from engine diagnostics to `tracing`.

use std::fmt;

use arqsim_core::{LogMask, Tracer};

use crate::endpoint::Side;

/// Forwards engine trace lines as `TRACE` events tagged with the side.
#[derive(Debug, Clone, Copy)]
pub struct TracingTracer {
    side: Side,
}

impl TracingTracer {
    /// Tracer for one endpoint.
    pub fn new(side: Side) -> Self {
        Self { side }
    }
}

impl Tracer for TracingTracer {
    fn trace(&mut self, kind: LogMask, current: u32, message: fmt::Arguments<'_>) {
        tracing::trace!(side = %self.side, t = current, ?kind, "{message}");
    }
}
