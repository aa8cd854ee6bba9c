//! Run summaries for each role.
//!
//! Runtimes keep these counters up to date while they run, log them at the
//! configured statistics interval, and return them when they stop.

use std::fmt;

use crate::feedback::{AckSummary, RttStats};

/// Totals for a chunked frame producer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SenderSummary {
    pub frames_sent: u64,
    pub chunks_sent: u64,
    /// Encoded bytes handed to the transport.
    pub bytes_sent: u64,
    /// Frames skipped because they could not be fragmented or encoded.
    pub frames_rejected: u64,
    /// Chunk datagrams the transport failed to send.
    pub send_errors: u64,
    /// Frames acknowledged by the consumer.
    pub acknowledged: u64,
    /// Frames written off by timeout or still pending at shutdown.
    pub unacknowledged: u64,
    pub rtt: RttStats,
}

impl SenderSummary {
    /// Fold the ack listener's results into the summary.
    ///
    /// `still_pending` counts records left in the pending map at shutdown.
    pub fn absorb_acks(&mut self, acks: &AckSummary, still_pending: u64) {
        self.acknowledged = acks.acknowledged;
        self.unacknowledged = acks.expired + still_pending;
        self.rtt = acks.rtt;
    }
}

impl fmt::Display for SenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent {} frames in {} chunks ({} bytes), {} acknowledged, {} unacknowledged, {} \
             rejected, {} send errors; {}",
            self.frames_sent,
            self.chunks_sent,
            self.bytes_sent,
            self.acknowledged,
            self.unacknowledged,
            self.frames_rejected,
            self.send_errors,
            self.rtt,
        )
    }
}

/// Totals for a chunked frame consumer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiverSummary {
    pub chunks_received: u64,
    pub frames_complete: u64,
    pub frames_partial: u64,
    /// Frames whose bytes did not divide into whole rows.
    pub frames_misaligned: u64,
    /// Frames finalized because the lag bound was exceeded.
    pub frames_evicted: u64,
    /// Partial frames dropped at shutdown.
    pub frames_discarded: u64,
    /// Chunks for frames already finalized.
    pub stale_chunks: u64,
    /// Chunks for an older frame still buffered but no longer collected.
    pub late_chunks: u64,
    pub duplicate_chunks: u64,
    /// Chunks contradicting the chunk count or layout of their frame.
    pub inconsistent_chunks: u64,
    pub malformed_datagrams: u64,
    /// Finalized frames dropped because the delivery queue was full.
    pub frames_dropped: u64,
    /// Acknowledgements the feedback transport failed to send.
    pub ack_errors: u64,
}

impl ReceiverSummary {
    /// Every frame handed to the application.
    #[must_use]
    pub const fn frames_delivered(&self) -> u64 { self.frames_complete + self.frames_partial }
}

impl fmt::Display for ReceiverSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received {} chunks, {} complete frames, {} partial ({} misaligned, {} evicted, {} \
             discarded, {} undeliverable); dropped {} stale, {} late, {} duplicate, {} \
             inconsistent, {} malformed",
            self.chunks_received,
            self.frames_complete,
            self.frames_partial,
            self.frames_misaligned,
            self.frames_evicted,
            self.frames_discarded,
            self.frames_dropped,
            self.stale_chunks,
            self.late_chunks,
            self.duplicate_chunks,
            self.inconsistent_chunks,
            self.malformed_datagrams,
        )
    }
}

/// Totals for a single-packet stream sender.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StreamSenderSummary {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub send_errors: u64,
    /// Feedback reports that validated.
    pub reports: u64,
    /// Feedback datagrams rejected as malformed.
    pub reports_rejected: u64,
    /// Loss rate from the most recent report.
    pub loss_rate: Option<f64>,
    pub rtt: RttStats,
}

impl fmt::Display for StreamSenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent {} packets ({} bytes), {} send errors, {} reports ({} rejected)",
            self.packets_sent, self.bytes_sent, self.send_errors, self.reports, self.reports_rejected,
        )?;
        if let Some(loss_rate) = self.loss_rate {
            write!(f, ", receiver loss {:.2}%", loss_rate * 100.0)?;
        }
        write!(f, "; {}", self.rtt)
    }
}

/// Totals for a single-packet stream receiver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StreamReceiverSummary {
    pub packets_received: u64,
    pub packets_lost: u64,
    pub duplicates: u64,
    pub malformed: u64,
    pub bytes_received: u64,
    pub loss_rate: f64,
    /// Packets dropped because the delivery queue was full.
    pub deliveries_dropped: u64,
    /// Feedback reports the transport failed to send.
    pub report_errors: u64,
}

impl fmt::Display for StreamReceiverSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received {} packets ({} bytes), lost {} ({:.2}%), {} duplicate, {} malformed, {} \
             undeliverable",
            self.packets_received,
            self.bytes_received,
            self.packets_lost,
            self.loss_rate * 100.0,
            self.duplicates,
            self.malformed,
            self.deliveries_dropped,
        )
    }
}
