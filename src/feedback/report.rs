//! Sender-side tracking of aggregate feedback reports.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::RttStats;
use crate::wire::{FeedbackReport, WireError};

/// Seconds since the UNIX epoch according to the wall clock.
///
/// Reports echo wall-clock timestamps, so round trips measured from them are
/// only as good as the sender's clock; a clock stepping backwards yields a
/// zero sample rather than a negative one.
#[must_use]
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}

/// One validated feedback report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportSample {
    pub rtt: Duration,
    pub sequence: u64,
    pub total_received: u64,
    pub total_lost: u64,
}

impl ReportSample {
    /// Loss rate observed by the receiver: lost packets over the packets
    /// the sender had emitted up to `sequence`.
    #[must_use]
    pub fn loss_rate(&self) -> f64 {
        self.total_lost as f64 / self.sequence.saturating_add(1) as f64
    }
}

/// Keep whichever of `current` and `sample` reports the later sequence.
/// Reordered reports never roll the receiver's totals backwards.
pub(crate) fn newest(current: Option<ReportSample>, sample: ReportSample) -> Option<ReportSample> {
    match current {
        Some(current) if current.sequence >= sample.sequence => Some(current),
        _ => Some(sample),
    }
}

/// Accumulates feedback reports into RTT statistics.
#[derive(Debug, Default)]
pub struct ReportTracker {
    latest: Option<ReportSample>,
    rtt: RttStats,
    rejected: u64,
}

impl ReportTracker {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Validate a report datagram and measure its round trip against the
    /// current wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] for short datagrams or a wrong magic number.
    /// Rejected datagrams leave the statistics untouched.
    pub fn process(&mut self, datagram: &[u8]) -> Result<ReportSample, WireError> {
        self.process_at(datagram, unix_timestamp())
    }

    /// Like [`ReportTracker::process`] with an explicit wall-clock reading.
    ///
    /// # Errors
    ///
    /// See [`ReportTracker::process`].
    pub fn process_at(&mut self, datagram: &[u8], now: f64) -> Result<ReportSample, WireError> {
        let report = FeedbackReport::decode(datagram).inspect_err(|_| self.rejected += 1)?;
        let rtt = Duration::try_from_secs_f64(now - report.send_timestamp).unwrap_or_default();
        let sample = ReportSample {
            rtt,
            sequence: report.sequence,
            total_received: report.total_received,
            total_lost: report.total_lost,
        };
        self.rtt.record(rtt);
        self.latest = newest(self.latest, sample);
        Ok(sample)
    }

    /// Valid report with the highest sequence number seen so far.
    #[must_use]
    pub const fn latest(&self) -> Option<ReportSample> { self.latest }

    #[must_use]
    pub const fn rtt(&self) -> &RttStats { &self.rtt }

    /// Receiver-reported loss rate from the most recent report.
    #[must_use]
    pub fn loss_rate(&self) -> Option<f64> { self.latest.map(|sample| sample.loss_rate()) }

    /// Number of datagrams rejected as malformed.
    #[must_use]
    pub const fn rejected(&self) -> u64 { self.rejected }
}
