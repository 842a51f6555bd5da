//! Property-based tests for determinism, integrity and drop ordering.

use std::collections::BTreeSet;

use arqsim_harness::{DropPolicy, SimConfig, Side, Simulation, SimulationReport};
use proptest::prelude::*;

fn run(config: SimConfig) -> SimulationReport {
    Simulation::new(config).expect("valid config").run().expect("run failed")
}

#[test]
fn identical_configs_produce_identical_reports() {
    let config = SimConfig::default().with_drop_targets([3, 10, 40]);
    let first = run(config.clone());
    let second = run(config);

    assert_eq!(first, second);
    assert_eq!(first.dropped_sns(Side::A), vec![3, 10, 40]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_runs_are_deterministic(
        targets in proptest::collection::btree_set(0u32..24, 0..6),
        total_sends in 1u32..24,
    ) {
        let config = SimConfig::default()
            .with_total_sends(total_sends)
            .with_drop_targets(targets.iter().copied());

        let first = run(config.clone());
        let second = run(config);

        // PROPERTY: Determinism - same inputs produce the same event sequence
        prop_assert_eq!(&first, &second);

        // PROPERTY: Integrity - every message arrived and verified
        prop_assert_eq!(first.completed, total_sends);

        // PROPERTY: Only sequence numbers that exist can be dropped, each once
        let expected: Vec<u32> = targets.iter().copied().filter(|&sn| sn < total_sends).collect();
        prop_assert_eq!(first.dropped_sns(Side::A), expected);
        prop_assert_eq!(first.a.overflowed, 0);
    }

    #[test]
    fn prop_drops_follow_target_order(
        targets in proptest::collection::vec(0u32..16, 0..8),
        observed in proptest::collection::vec(0u32..16, 0..64),
    ) {
        let mut policy = DropPolicy::new(targets.iter().copied());
        let mut dropped = Vec::new();
        let mut model_cursor = 0;

        for &sn in &observed {
            let expected = targets.get(model_cursor) == Some(&sn);
            let actual = policy.check(Some(sn));

            // PROPERTY: Only the head target can match
            prop_assert_eq!(actual, expected);
            if actual {
                model_cursor += 1;
                dropped.push(sn);
            }
        }

        // PROPERTY: Drops are a prefix of the target list, in list order
        prop_assert_eq!(&dropped[..], &targets[..dropped.len()]);
        prop_assert_eq!(policy.matched(), dropped.len());
    }

    #[test]
    fn prop_seeded_targets_are_distinct_and_bounded(
        seed in any::<u64>(),
        count in 0usize..32,
        max_sn in 1u32..256,
    ) {
        let policy = DropPolicy::seeded(seed, count, max_sn);
        let unique: BTreeSet<_> = policy.targets().iter().copied().collect();

        prop_assert_eq!(unique.len(), policy.targets().len());
        prop_assert_eq!(policy.targets().len(), count.min(max_sn as usize));
        prop_assert!(policy.targets().iter().all(|&sn| sn < max_sn));
        prop_assert_eq!(policy, DropPolicy::seeded(seed, count, max_sn));
    }
}
