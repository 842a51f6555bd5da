//! arqsim runner.
//!
//! Runs the reference scenario: 128 MSS-sized messages from A to B over a
//! lossless link with 100 ms ticks, then logs the outcome.
//!
//! # Usage
//!
//! ```bash
//! # Summary only
//! arqsim
//!
//! # Per-tick congestion rows
//! RUST_LOG=arqsim_harness=debug arqsim
//! ```

use arqsim_harness::{SimConfig, Simulation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let report = Simulation::new(SimConfig::default())?.run()?;

    tracing::info!(
        sent = report.a.sent,
        acks = report.b.sent,
        overflowed = report.a.overflowed + report.b.overflowed,
        ticks = report.tick_stats.len(),
        "finished at t={}",
        report.finish_time
    );

    Ok(())
}
