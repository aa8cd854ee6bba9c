//! Cancellable receive loop shared by every datagram consumer.

use std::time::Duration;

use tokio::{
    select,
    time::{Instant, Interval, MissedTickBehavior, interval_at, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::BackoffConfig;
use crate::transport::Transport;

/// What woke the loop up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopEvent {
    /// A datagram of the given length is in the buffer.
    Datagram(usize),
    /// The housekeeping interval elapsed.
    Tick,
    /// The shutdown token was cancelled.
    Shutdown,
}

/// Drives one transport: races `recv` against cancellation and a periodic
/// housekeeping tick, backing off exponentially while `recv` keeps failing.
///
/// The loop never waits for a particular datagram, so callers always make
/// progress on whatever arrives next.
#[derive(Debug)]
pub struct ReceiveLoop {
    shutdown: CancellationToken,
    backoff: BackoffConfig,
    failures: u32,
    ticker: Interval,
}

impl ReceiveLoop {
    /// Create a loop that ticks every `tick_every`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(shutdown: CancellationToken, backoff: BackoffConfig, tick_every: Duration) -> Self {
        let backoff = backoff.normalized();
        let tick_every = tick_every.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + tick_every, tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            shutdown,
            backoff,
            failures: 0,
            ticker,
        }
    }

    /// Wait for the next event.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn next<T: Transport + ?Sized>(&mut self, transport: &T, buf: &mut [u8]) -> LoopEvent {
        loop {
            select! {
                biased;

                () = self.shutdown.cancelled() => return LoopEvent::Shutdown,
                _ = self.ticker.tick() => return LoopEvent::Tick,
                res = transport.recv(buf) => match res {
                    Ok(len) => {
                        self.failures = 0;
                        return LoopEvent::Datagram(len);
                    }
                    Err(e) => {
                        let delay = self.current_delay();
                        warn!(error = %e, retry_in = ?delay, "datagram receive failed");
                        select! {
                            biased;

                            () = self.shutdown.cancelled() => return LoopEvent::Shutdown,
                            () = sleep(delay) => {}
                        }
                        self.failures = self.failures.saturating_add(1);
                    }
                },
            }
        }
    }

    /// Wait the next failed receive would incur.
    #[must_use]
    pub fn current_delay(&self) -> Duration { self.backoff.delay_for(self.failures) }
}
