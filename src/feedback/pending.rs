//! Send timestamps awaiting acknowledgement.
//!
//! [`PendingAcks`] is written by the pacing loop and drained by the ack
//! listener running concurrently, so records live in a [`DashMap`]. Removal
//! is atomic, which makes every record yield at most one RTT sample even
//! when duplicate acks race each other.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::frame::FrameId;

/// One round-trip measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RttSample {
    pub frame_id: FrameId,
    pub rtt: Duration,
}

/// Concurrent map of frame send times keyed by [`FrameId`].
#[derive(Debug, Default)]
pub struct PendingAcks(DashMap<FrameId, Instant>);

impl PendingAcks {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Remember when `frame_id` was sent.
    pub fn record(&self, frame_id: FrameId, sent_at: Instant) { self.0.insert(frame_id, sent_at); }

    /// Consume the record for `frame_id`, measuring against the current time.
    ///
    /// Returns `None` for unknown or already acknowledged frames.
    pub fn acknowledge(&self, frame_id: FrameId) -> Option<RttSample> {
        self.acknowledge_at(frame_id, Instant::now())
    }

    /// Consume the record for `frame_id`, measuring against `now`.
    pub fn acknowledge_at(&self, frame_id: FrameId, now: Instant) -> Option<RttSample> {
        let (frame_id, sent_at) = self.0.remove(&frame_id)?;
        Some(RttSample {
            frame_id,
            rtt: now.saturating_duration_since(sent_at),
        })
    }

    /// Whether a record for `frame_id` is still waiting.
    #[must_use]
    pub fn contains(&self, frame_id: FrameId) -> bool { self.0.contains_key(&frame_id) }

    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Drop records older than `max_age`, returning their identifiers.
    ///
    /// `DashMap::retain` takes per-shard write locks, so concurrent
    /// acknowledgements may wait briefly while the sweep runs.
    pub fn evict_older_than(&self, max_age: Duration, now: Instant) -> Vec<FrameId> {
        let mut evicted = Vec::new();
        self.0.retain(|frame_id, sent_at| {
            let expired = now.saturating_duration_since(*sent_at) >= max_age;
            if expired {
                evicted.push(*frame_id);
            }
            !expired
        });
        evicted.sort_unstable();
        evicted
    }
}
