//! Background listeners for the feedback channel.
//!
//! A listener owns the feedback transport and a [`FeedbackHandler`]. Each
//! datagram is handed to the handler; any event it yields is forwarded over
//! an unbounded channel so the sender can observe samples without polling.
//! On shutdown the handler's summary becomes the task's output.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, warn};

use super::{PendingAcks, ReportSample, ReportTracker, RttSample, RttStats};
use crate::{
    metrics::{self, RttSource},
    runtime::{BackoffConfig, LoopEvent, ReceiveLoop},
    transport::{MAX_DATAGRAM_SIZE, Transport},
    wire::decode_ack,
};

/// Interprets feedback datagrams.
pub trait FeedbackHandler: Send + 'static {
    /// Observation surfaced for each useful datagram.
    type Event: Send + 'static;
    /// Final state returned when the listener stops.
    type Summary: Send + 'static;

    /// Handle one datagram.
    fn on_datagram(&mut self, datagram: &[u8]) -> Option<Self::Event>;

    /// Periodic housekeeping.
    fn on_tick(&mut self, _now: Instant) {}

    /// Consume the handler once the listener stops.
    fn finish(self) -> Self::Summary;
}

/// Runtime settings for a feedback listener.
#[derive(Clone, Debug)]
pub struct ListenerOptions {
    pub shutdown: CancellationToken,
    pub backoff: BackoffConfig,
    /// How often [`FeedbackHandler::on_tick`] runs.
    pub tick_every: Duration,
}

/// Receive feedback until `options.shutdown` is cancelled.
pub async fn run_listener<T, H>(
    transport: T,
    mut handler: H,
    events: mpsc::UnboundedSender<H::Event>,
    options: ListenerOptions,
) -> H::Summary
where
    T: Transport,
    H: FeedbackHandler,
{
    let mut rx = ReceiveLoop::new(options.shutdown, options.backoff, options.tick_every);
    let mut buf = vec![0_u8; MAX_DATAGRAM_SIZE];
    loop {
        match rx.next(&transport, &mut buf).await {
            LoopEvent::Datagram(len) => {
                if let Some(event) = handler.on_datagram(&buf[..len]) {
                    // Nobody listening is fine; the summary still counts it.
                    let _ = events.send(event);
                }
            }
            LoopEvent::Tick => handler.on_tick(Instant::now()),
            LoopEvent::Shutdown => break,
        }
    }
    debug!("feedback listener stopped");
    handler.finish()
}

/// A listener running on its own task.
#[derive(Debug)]
pub struct ListenerTask<S> {
    shutdown: CancellationToken,
    tracker: TaskTracker,
    handle: JoinHandle<S>,
}

impl<S: Send + 'static> ListenerTask<S> {
    /// Spawn [`run_listener`] for `transport` and `handler`.
    ///
    /// Returns the task together with the receiving end of its event
    /// channel.
    #[must_use]
    pub fn spawn<T, H>(
        transport: T,
        handler: H,
        options: ListenerOptions,
    ) -> (Self, mpsc::UnboundedReceiver<H::Event>)
    where
        T: Transport + 'static,
        H: FeedbackHandler<Summary = S>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = options.shutdown.clone();
        let tracker = TaskTracker::new();
        let handle = tracker.spawn(run_listener(transport, handler, tx, options));
        tracker.close();
        (
            Self {
                shutdown,
                tracker,
                handle,
            },
            rx,
        )
    }

    /// Stop the listener and wait up to `join_timeout` for its summary.
    ///
    /// Returns `None` if the task panicked or did not stop in time; a task
    /// that overruns is aborted.
    pub async fn join(self, join_timeout: Duration) -> Option<S> {
        let Self {
            shutdown,
            tracker,
            mut handle,
        } = self;
        shutdown.cancel();
        match timeout(join_timeout, &mut handle).await {
            Ok(Ok(summary)) => {
                tracker.wait().await;
                Some(summary)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "feedback listener task failed");
                None
            }
            Err(_) => {
                warn!(timeout = ?join_timeout, "feedback listener did not stop in time; aborting");
                handle.abort();
                None
            }
        }
    }
}

/// Counters accumulated by an [`AckHandler`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AckSummary {
    pub rtt: RttStats,
    /// Acks that produced an RTT sample.
    pub acknowledged: u64,
    /// Acks for unknown or already acknowledged frames.
    pub ignored: u64,
    pub malformed: u64,
    /// Records dropped after waiting longer than the ack timeout.
    pub expired: u64,
}

/// Matches per-frame acks against [`PendingAcks`].
#[derive(Debug)]
pub struct AckHandler {
    pending: std::sync::Arc<PendingAcks>,
    ack_timeout: Duration,
    summary: AckSummary,
}

impl AckHandler {
    #[must_use]
    pub fn new(pending: std::sync::Arc<PendingAcks>, ack_timeout: Duration) -> Self {
        Self {
            pending,
            ack_timeout,
            summary: AckSummary::default(),
        }
    }
}

impl FeedbackHandler for AckHandler {
    type Event = RttSample;
    type Summary = AckSummary;

    fn on_datagram(&mut self, datagram: &[u8]) -> Option<RttSample> {
        let frame_id = match decode_ack(datagram) {
            Ok(frame_id) => frame_id,
            Err(e) => {
                self.summary.malformed += 1;
                metrics::inc_malformed(e.kind());
                warn!(error = %e, len = datagram.len(), "discarding malformed ack");
                return None;
            }
        };
        let Some(sample) = self.pending.acknowledge(frame_id) else {
            self.summary.ignored += 1;
            debug!(%frame_id, "ignoring ack for unknown or acknowledged frame");
            return None;
        };
        self.summary.acknowledged += 1;
        self.summary.rtt.record(sample.rtt);
        metrics::observe_rtt(RttSource::Ack, sample.rtt);
        debug!(%frame_id, rtt_ms = sample.rtt.as_secs_f64() * 1e3, "frame acknowledged");
        Some(sample)
    }

    fn on_tick(&mut self, now: Instant) {
        let expired = self.pending.evict_older_than(self.ack_timeout, now);
        if expired.is_empty() {
            return;
        }
        let count = expired.len() as u64;
        self.summary.expired += count;
        metrics::add_unacknowledged(count);
        warn!(
            count,
            oldest = %expired[0],
            timeout = ?self.ack_timeout,
            "frames were never acknowledged"
        );
    }

    fn finish(self) -> AckSummary { self.summary }
}

/// Feeds aggregate reports into a [`ReportTracker`].
#[derive(Debug, Default)]
pub struct ReportHandler {
    tracker: ReportTracker,
}

impl ReportHandler {
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl FeedbackHandler for ReportHandler {
    type Event = ReportSample;
    type Summary = ReportTracker;

    fn on_datagram(&mut self, datagram: &[u8]) -> Option<ReportSample> {
        match self.tracker.process(datagram) {
            Ok(sample) => {
                metrics::observe_rtt(RttSource::Report, sample.rtt);
                debug!(
                    sequence = sample.sequence,
                    rtt_ms = sample.rtt.as_secs_f64() * 1e3,
                    loss_rate = sample.loss_rate(),
                    "feedback report"
                );
                Some(sample)
            }
            Err(e) => {
                metrics::inc_malformed(e.kind());
                warn!(error = %e, len = datagram.len(), "discarding malformed feedback report");
                None
            }
        }
    }

    fn finish(self) -> ReportTracker { self.tracker }
}
