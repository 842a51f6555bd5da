//! Congestion-window observations taken from the per-tick stats rows.

use arqsim_harness::{SimConfig, SimEvent, Side, Simulation, SimulationReport};

fn run(config: SimConfig) -> SimulationReport {
    Simulation::new(config).expect("valid config").run().expect("run failed")
}

#[test]
fn window_never_shrinks_without_loss() {
    let report = run(SimConfig::default());
    assert!(report.tick_stats.len() >= 128);

    for pair in report.tick_stats.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        assert!(
            after.effective_cwnd >= before.effective_cwnd,
            "effective cwnd shrank at t={}: {} -> {}",
            after.time,
            before.effective_cwnd,
            after.effective_cwnd
        );
        assert!(after.cwnd >= before.cwnd, "raw cwnd shrank at t={}", after.time);
        assert_eq!(after.ssthresh, before.ssthresh);
    }
}

#[test]
fn window_grows_past_one() {
    let report = run(SimConfig::default());
    let last = report.tick_stats.last().expect("at least one tick");
    assert!(last.cwnd > 2, "slow start then additive increase should open the window");
    // the row is taken before the final ack comes back
    assert_eq!(last.snd_nxt, 128);
    assert_eq!(last.snd_una, 127);
}

#[test]
fn threshold_drops_after_loss() {
    let mut config = SimConfig::default().with_total_sends(48).with_drop_targets([20]);
    config.a.initial_ssthresh = Some(1000);
    let report = run(config);

    let drop_time = report
        .events
        .iter()
        .find_map(|event| match *event {
            SimEvent::Dropped { time, side: Side::A, .. } => Some(time),
            _ => None,
        })
        .expect("sn 20 was dropped");

    // ORACLE: untouched until the loss, then halved from at most 32
    let reduced = report
        .tick_stats
        .iter()
        .find(|row| row.ssthresh < 1000)
        .expect("loss must lower ssthresh");
    assert!(reduced.time > drop_time);
    assert!((2..=16).contains(&reduced.ssthresh), "ssthresh {}", reduced.ssthresh);
    assert!(
        report
            .tick_stats
            .iter()
            .filter(|row| row.time <= drop_time)
            .all(|row| row.ssthresh == 1000)
    );
    assert_eq!(report.completed, 48);
}

#[test]
fn retransmission_timeout_resets_window() {
    let report = run(SimConfig::single_transfer().with_drop_targets([0]));

    // the tick that resends sn=0 observes cwnd back at one
    let resend = report
        .tick_stats
        .iter()
        .find(|row| row.time == 300)
        .expect("tick at t=300");
    assert_eq!(resend.cwnd, 1);
    assert_eq!(resend.ssthresh, 2);
}
