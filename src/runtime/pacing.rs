//! Fixed-rate send pacing.

use std::time::Duration;

use tokio::{
    select,
    time::{Instant, Interval, MissedTickBehavior, interval, interval_at},
};
use tokio_util::sync::CancellationToken;

/// Action the pacer asks the sender to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacerAction {
    /// Emit the next frame.
    SendNow,
    /// Log periodic statistics.
    Report,
    /// Stop sending.
    Shutdown,
}

/// Paces a sender to one frame per tick.
///
/// The first frame is due immediately. A slow send delays later ticks rather
/// than bursting to catch up.
#[derive(Debug)]
pub struct Pacer {
    shutdown: CancellationToken,
    frames: Interval,
    reports: Interval,
}

impl Pacer {
    /// Create a pacer emitting `rate_hz` frames per second and reporting
    /// every `report_every`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(rate_hz: f64, report_every: Duration, shutdown: CancellationToken) -> Self {
        let mut frames = interval(frame_period(rate_hz));
        frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let report_every = report_every.max(Duration::from_millis(1));
        let mut reports = interval_at(Instant::now() + report_every, report_every);
        reports.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            shutdown,
            frames,
            reports,
        }
    }

    /// Wait until the next action is due.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn next(&mut self) -> PacerAction {
        select! {
            biased;

            () = self.shutdown.cancelled() => PacerAction::Shutdown,
            _ = self.reports.tick() => PacerAction::Report,
            _ = self.frames.tick() => PacerAction::SendNow,
        }
    }
}

/// Interval between frames for `rate_hz`, clamped to at least one
/// microsecond. Non-finite or non-positive rates fall back to one frame per
/// second.
#[must_use]
pub fn frame_period(rate_hz: f64) -> Duration {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Duration::from_secs(1);
    }
    Duration::try_from_secs_f64(rate_hz.recip())
        .unwrap_or(Duration::from_secs(1))
        .max(Duration::from_micros(1))
}
