//! Metric helpers for `framecast`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// Counter of chunk datagrams, labelled by direction.
pub const CHUNKS_TOTAL: &str = "framecast_chunks_total";
/// Counter of finalized frames, labelled `complete` or `partial`.
pub const FRAMES_FINALIZED: &str = "framecast_frames_finalized_total";
/// Counter of frames finalized because the buffer exceeded its lag bound.
pub const FRAMES_EVICTED: &str = "framecast_frames_evicted_total";
/// Counter of chunks discarded because their frame was already processed.
pub const CHUNKS_STALE: &str = "framecast_chunks_stale_total";
/// Counter of datagrams that failed to decode, labelled by error kind.
pub const DATAGRAMS_MALFORMED: &str = "framecast_datagrams_malformed_total";
/// Counter of sent frames whose acknowledgement never arrived.
pub const FRAMES_UNACKNOWLEDGED: &str = "framecast_frames_unacknowledged_total";
/// Counter of stream packets the receiver inferred as lost.
pub const PACKETS_LOST: &str = "framecast_packets_lost_total";
/// Histogram of round-trip times in seconds, labelled by feedback source.
pub const RTT_SECONDS: &str = "framecast_rtt_seconds";

/// Direction of datagram flow.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Datagrams received from a peer.
    Inbound,
    /// Datagrams sent to a peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "used by metric labels"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Which feedback path produced an RTT sample.
#[derive(Clone, Copy, Debug)]
pub enum RttSource {
    /// Per-frame acknowledgement.
    Ack,
    /// Aggregate stream feedback report.
    Report,
}

impl RttSource {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "used by metric labels"))]
    fn as_str(self) -> &'static str {
        match self {
            RttSource::Ack => "ack",
            RttSource::Report => "report",
        }
    }
}

/// Record a chunk datagram for the given direction.
pub fn inc_chunks(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(CHUNKS_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a finalized frame.
pub fn inc_frames_finalized(complete: bool) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_FINALIZED, "completeness" => if complete { "complete" } else { "partial" })
        .increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = complete;
}

/// Record a frame evicted by the lag bound.
pub fn inc_frames_evicted() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_EVICTED).increment(1);
}

/// Record a stale chunk.
pub fn inc_chunks_stale() {
    #[cfg(feature = "metrics")]
    counter!(CHUNKS_STALE).increment(1);
}

/// Record a datagram that failed to decode.
pub fn inc_malformed(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(DATAGRAMS_MALFORMED, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record frames whose acknowledgement timed out.
pub fn add_unacknowledged(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_UNACKNOWLEDGED).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record stream packets inferred as lost.
pub fn add_packets_lost(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(PACKETS_LOST).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record a round-trip sample.
pub fn observe_rtt(source: RttSource, rtt: std::time::Duration) {
    #[cfg(feature = "metrics")]
    histogram!(RTT_SECONDS, "source" => source.as_str()).record(rtt.as_secs_f64());
    #[cfg(not(feature = "metrics"))]
    let _ = (source, rtt);
}
