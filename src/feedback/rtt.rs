//! Round-trip statistics.

use std::{fmt, time::Duration};

/// Weight of a new sample in the smoothed RTT (RFC 6298 alpha, 1/8).
pub const SRTT_ALPHA: f64 = 0.125;

/// Running RTT statistics across samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RttStats {
    samples: u64,
    latest: Duration,
    min: Duration,
    max: Duration,
    total: Duration,
    srtt_secs: f64,
}

impl RttStats {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Fold a sample into the statistics.
    ///
    /// The first sample seeds the smoothed RTT; later ones update it as
    /// `srtt = (1 - alpha) * srtt + alpha * sample`.
    pub fn record(&mut self, rtt: Duration) {
        let secs = rtt.as_secs_f64();
        if self.samples == 0 {
            self.min = rtt;
            self.max = rtt;
            self.srtt_secs = secs;
        } else {
            self.min = self.min.min(rtt);
            self.max = self.max.max(rtt);
            self.srtt_secs = (1.0 - SRTT_ALPHA) * self.srtt_secs + SRTT_ALPHA * secs;
        }
        self.latest = rtt;
        self.total = self.total.saturating_add(rtt);
        self.samples += 1;
    }

    #[must_use]
    pub const fn samples(&self) -> u64 { self.samples }

    #[must_use]
    pub fn latest(&self) -> Option<Duration> { self.sampled(self.latest) }

    #[must_use]
    pub fn min(&self) -> Option<Duration> { self.sampled(self.min) }

    #[must_use]
    pub fn max(&self) -> Option<Duration> { self.sampled(self.max) }

    /// Arithmetic mean of all samples.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        let samples = u32::try_from(self.samples).unwrap_or(u32::MAX);
        (self.samples > 0).then(|| self.total / samples)
    }

    /// Exponentially smoothed RTT.
    #[must_use]
    pub fn smoothed(&self) -> Option<Duration> {
        (self.samples > 0).then(|| Duration::from_secs_f64(self.srtt_secs))
    }

    fn sampled(&self, value: Duration) -> Option<Duration> { (self.samples > 0).then_some(value) }
}

impl fmt::Display for RttStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min(), self.mean(), self.max(), self.smoothed()) {
            (Some(min), Some(mean), Some(max), Some(srtt)) => write!(
                f,
                "rtt min/mean/max {:.2}/{:.2}/{:.2} ms, smoothed {:.2} ms over {} samples",
                min.as_secs_f64() * 1e3,
                mean.as_secs_f64() * 1e3,
                max.as_secs_f64() * 1e3,
                srtt.as_secs_f64() * 1e3,
                self.samples,
            ),
            _ => f.write_str("no rtt samples"),
        }
    }
}
