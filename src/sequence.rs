//! Sequence tracking for single-packet streams.
//!
//! Packets carry a monotonically increasing sequence number starting at
//! zero. Gaps are counted as loss the moment a later packet arrives; packets
//! at or below the highest sequence seen are discarded without touching the
//! counters.

/// Verdict for one observed sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceStatus {
    /// Newer than anything seen; `lost` packets were skipped to reach it.
    Fresh { lost: u64 },
    /// At or below the highest sequence seen.
    Duplicate,
}

/// Loss detector driven by packet sequence numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceTracker {
    last: Option<u64>,
    received: u64,
    lost: u64,
}

impl SequenceTracker {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Classify `sequence` and update the counters for fresh packets.
    ///
    /// Before any packet arrives every sequence below the first one observed
    /// counts as lost, so a stream joined at sequence 7 starts with seven
    /// losses.
    pub fn observe(&mut self, sequence: u64) -> SequenceStatus {
        let expected = match self.last {
            Some(last) if sequence <= last => return SequenceStatus::Duplicate,
            Some(last) => last + 1,
            None => 0,
        };
        let lost = sequence - expected;
        self.lost = self.lost.saturating_add(lost);
        self.received += 1;
        self.last = Some(sequence);
        SequenceStatus::Fresh { lost }
    }

    /// Highest sequence accepted so far.
    #[must_use]
    pub const fn last_sequence(&self) -> Option<u64> { self.last }

    #[must_use]
    pub const fn total_received(&self) -> u64 { self.received }

    #[must_use]
    pub const fn total_lost(&self) -> u64 { self.lost }

    /// Lost packets over the packets the sender emitted up to the highest
    /// sequence seen; zero before the first packet.
    #[must_use]
    pub fn loss_rate(&self) -> f64 {
        match self.last {
            Some(last) => self.lost as f64 / last.saturating_add(1) as f64,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::in_order(&[0, 1, 2, 3], 4, 0)]
    #[case::gap(&[0, 1, 4], 3, 2)]
    #[case::late_join(&[7, 8], 2, 7)]
    #[case::reordered(&[0, 2, 1, 3], 3, 1)]
    #[case::duplicates(&[0, 0, 1, 1, 1], 2, 0)]
    fn counts_losses(#[case] sequences: &[u64], #[case] received: u64, #[case] lost: u64) {
        let mut tracker = SequenceTracker::new();
        for &sequence in sequences {
            tracker.observe(sequence);
        }
        assert_eq!(tracker.total_received(), received);
        assert_eq!(tracker.total_lost(), lost);
    }

    #[test]
    fn late_packet_is_duplicate_and_leaves_counters() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.observe(0), SequenceStatus::Fresh { lost: 0 });
        assert_eq!(tracker.observe(3), SequenceStatus::Fresh { lost: 2 });
        let before = tracker;
        assert_eq!(tracker.observe(2), SequenceStatus::Duplicate);
        assert_eq!(tracker, before);
        assert_eq!(tracker.last_sequence(), Some(3));
    }

    #[test]
    fn loss_rate_uses_highest_sequence() {
        let mut tracker = SequenceTracker::new();
        assert!(tracker.loss_rate().abs() < f64::EPSILON);
        tracker.observe(0);
        tracker.observe(4);
        assert!((tracker.loss_rate() - 0.6).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn received_plus_lost_covers_highest_sequence(
            sequences in proptest::collection::vec(0_u64..200, 1..100),
        ) {
            let mut tracker = SequenceTracker::new();
            for sequence in sequences {
                tracker.observe(sequence);
            }
            let last = tracker.last_sequence().expect("at least one packet");
            prop_assert_eq!(tracker.total_received() + tracker.total_lost(), last + 1);
        }
    }
}
