//! Retry pacing for receive loops that hit transport errors.

use std::time::Duration;

/// Exponential back-off applied after consecutive failed receives.
///
/// The `n`th consecutive failure waits `floor * 2^n`, never more than
/// `ceiling`. A successful receive resets the failure count. The defaults
/// are a 1 ms floor and a 1 s ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Wait after the first failure.
    pub floor: Duration,
    /// Longest wait between retries.
    pub ceiling: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            floor: Duration::from_millis(1),
            ceiling: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Raise the floor to at least 1 ms and the ceiling to at least the
    /// floor.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use framecast::runtime::BackoffConfig;
    ///
    /// let cfg = BackoffConfig {
    ///     floor: Duration::from_millis(5),
    ///     ceiling: Duration::from_millis(1),
    /// }
    /// .normalized();
    /// assert_eq!(cfg.ceiling, Duration::from_millis(5));
    /// ```
    #[must_use]
    pub fn normalized(self) -> Self {
        let floor = self.floor.max(Duration::from_millis(1));
        Self {
            floor,
            ceiling: self.ceiling.max(floor),
        }
    }

    /// Wait before retrying after `failures` consecutive failed receives,
    /// counting from zero.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        let factor = 1_u32.checked_shl(failures).unwrap_or(u32::MAX);
        self.floor.saturating_mul(factor).min(self.ceiling)
    }
}
