//! Deterministic loss injection.
//!
//! A [`DropPolicy`] is an ordered list of sequence numbers plus a cursor.
//! Each emitted datagram's sequence number is compared against the target
//! under the cursor only; a match discards the datagram and moves the cursor
//! forward.
//!
//! # Invariants
//!
//! - The cursor never moves backwards
//! - The cursor advances only on a match, by exactly one
//! - Each target discards at most one datagram (a later retransmission of
//!   the same sn passes unless the sn is listed again)
//! - Targets are matched strictly in list order; an unsorted list can leave
//!   later targets unreachable

use arqsim_proto::SequenceNumber;
use rand::{SeedableRng, seq::index};
use rand_chacha::ChaCha8Rng;

/// Match `sn` against the target at `cursor`.
///
/// Returns the advanced cursor on a match and `None` otherwise, including
/// when every target is consumed.
pub fn step(targets: &[SequenceNumber], cursor: usize, sn: SequenceNumber) -> Option<usize> {
    match targets.get(cursor) {
        Some(&target) if target == sn => Some(cursor + 1),
        _ => None,
    }
}

/// Ordered drop targets with a forward-only cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropPolicy {
    targets: Vec<SequenceNumber>,
    cursor: usize,
}

impl DropPolicy {
    /// Drop nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Drop the first datagram carrying `sn`.
    pub fn single(sn: SequenceNumber) -> Self {
        Self::new([sn])
    }

    /// Drop the listed sequence numbers, in this order.
    pub fn new(targets: impl IntoIterator<Item = SequenceNumber>) -> Self {
        Self { targets: targets.into_iter().collect(), cursor: 0 }
    }

    /// `count` distinct targets below `max_sn`, sorted, from a seeded RNG.
    ///
    /// The same seed always yields the same targets.
    pub fn seeded(seed: u64, count: usize, max_sn: SequenceNumber) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let range = max_sn as usize;
        let mut targets: Vec<SequenceNumber> = index::sample(&mut rng, range, count.min(range))
            .into_iter()
            .map(|i| i as SequenceNumber)
            .collect();
        targets.sort_unstable();
        Self::new(targets)
    }

    /// Decide the fate of a datagram. `true` means discard it.
    ///
    /// Datagrams too short to carry a sequence number never match.
    pub fn check(&mut self, sn: Option<SequenceNumber>) -> bool {
        let Some(sn) = sn else {
            return false;
        };
        match step(&self.targets, self.cursor, sn) {
            Some(next) => {
                self.cursor = next;
                true
            },
            None => false,
        }
    }

    /// Target currently awaited, if any.
    pub fn next_target(&self) -> Option<SequenceNumber> {
        self.targets.get(self.cursor).copied()
    }

    /// Number of targets already matched.
    pub fn matched(&self) -> usize {
        self.cursor
    }

    /// All targets, matched or not.
    pub fn targets(&self) -> &[SequenceNumber] {
        &self.targets
    }

    /// True once every target has discarded a datagram.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_policy_never_drops() {
        let mut policy = DropPolicy::none();
        assert!(!policy.check(Some(0)));
        assert!(policy.is_exhausted());
    }

    #[test]
    fn single_target_drops_once() {
        let mut policy = DropPolicy::single(5);
        assert!(!policy.check(Some(4)));
        assert!(policy.check(Some(5)));
        // retransmission of the same sn passes
        assert!(!policy.check(Some(5)));
        assert_eq!(policy.matched(), 1);
    }

    #[test]
    fn repeated_target_drops_retransmission_too() {
        let mut policy = DropPolicy::new([0, 0]);
        assert!(policy.check(Some(0)));
        assert!(policy.check(Some(0)));
        assert!(!policy.check(Some(0)));
    }

    #[test]
    fn only_the_awaited_target_matches() {
        let mut policy = DropPolicy::new([3, 1]);
        assert!(!policy.check(Some(1)), "1 is not awaited yet");
        assert!(policy.check(Some(3)));
        assert_eq!(policy.next_target(), Some(1));
        assert!(policy.check(Some(1)));
    }

    #[test]
    fn short_datagrams_never_match() {
        let mut policy = DropPolicy::single(0);
        assert!(!policy.check(None));
        assert_eq!(policy.next_target(), Some(0));
    }

    #[test]
    fn step_is_pure() {
        let targets = [2, 4];
        assert_eq!(step(&targets, 0, 2), Some(1));
        assert_eq!(step(&targets, 0, 4), None);
        assert_eq!(step(&targets, 2, 4), None);
    }

    #[test]
    fn seeded_is_reproducible_and_sorted() {
        let first = DropPolicy::seeded(7, 10, 128);
        let second = DropPolicy::seeded(7, 10, 128);
        assert_eq!(first, second);
        assert_eq!(first.targets().len(), 10);
        assert!(first.targets().windows(2).all(|w| w[0] < w[1]));
        assert!(first.targets().iter().all(|&sn| sn < 128));
    }

    #[test]
    fn seeded_count_is_capped() {
        let policy = DropPolicy::seeded(1, 50, 8);
        assert_eq!(policy.targets(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
