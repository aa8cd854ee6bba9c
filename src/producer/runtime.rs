//! Paced producer with a background ack listener.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{Instant, timeout_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Producer;
use crate::{
    config::{ConfigError, ProducerConfig},
    error::FramecastError,
    feedback::{
        AckHandler,
        AckSummary,
        ListenerOptions,
        ListenerTask,
        PendingAcks,
        RttSample,
        RttStats,
    },
    frame::Payload,
    runtime::{BackoffConfig, Pacer, PacerAction},
    stats::SenderSummary,
    transport::{Transport, UdpTransport},
};

/// Tick period of the ack listener, which sweeps timed-out records.
const EVICTION_SWEEP: Duration = Duration::from_secs(1);

/// A [`Producer`] driven at a fixed rate.
///
/// ```no_run
/// use framecast::{config::ProducerConfig, producer::ProducerRuntime, synthetic::SyntheticCloud};
///
/// # async fn demo() -> framecast::Result<()> {
/// let mut runtime = ProducerRuntime::connect(&ProducerConfig::default()).await?;
/// runtime.run(SyntheticCloud::default().take(100)).await;
/// let summary = runtime.shutdown().await;
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProducerRuntime<T> {
    producer: Producer<T>,
    shutdown: CancellationToken,
    listener: ListenerTask<AckSummary>,
    samples: mpsc::UnboundedReceiver<RttSample>,
    send_rate_hz: f64,
    stats_interval: Duration,
    join_timeout: Duration,
}

impl ProducerRuntime<UdpTransport> {
    /// Connect the data socket and bind the feedback socket.
    ///
    /// # Errors
    ///
    /// Returns [`FramecastError::Config`] for invalid settings and
    /// [`FramecastError::Transport`] if a socket cannot be set up.
    pub async fn connect(config: &ProducerConfig) -> Result<Self, FramecastError> {
        config.validate()?;
        let data = UdpTransport::connect_from(config.data_bind, config.data_peer).await?;
        let feedback = UdpTransport::bind(config.feedback_bind).await?;
        Ok(Self::start(config, data, feedback)?)
    }
}

impl<T: Transport> ProducerRuntime<T> {
    /// Validate `config` and spawn the ack listener on `feedback`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for out-of-range settings.
    pub fn start<F>(config: &ProducerConfig, data: T, feedback: F) -> Result<Self, ConfigError>
    where
        F: Transport + 'static,
    {
        config.validate()?;
        let pending = Arc::new(PendingAcks::new());
        let shutdown = CancellationToken::new();
        let (listener, samples) = ListenerTask::spawn(
            feedback,
            AckHandler::new(Arc::clone(&pending), config.ack_timeout()),
            ListenerOptions {
                shutdown: shutdown.child_token(),
                backoff: BackoffConfig::default(),
                tick_every: EVICTION_SWEEP.min(config.ack_timeout()),
            },
        );
        info!(
            rate_hz = config.send_rate_hz,
            max_rows_per_chunk = config.max_rows_per_chunk,
            "producer started"
        );
        Ok(Self {
            producer: Producer::new(config.fragmentation()?, data, pending),
            shutdown,
            listener,
            samples,
            send_rate_hz: config.send_rate_hz,
            stats_interval: config.stats_interval(),
            join_timeout: config.join_timeout(),
        })
    }

    /// Token that stops [`ProducerRuntime::run`] when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }

    #[must_use]
    pub const fn producer(&self) -> &Producer<T> { &self.producer }

    /// Send frames from `frames` at the configured rate until the source is
    /// exhausted or shutdown is requested.
    ///
    /// Returns the number of frames sent.
    pub async fn run<I>(&mut self, frames: I) -> u64
    where
        I: IntoIterator<Item = Payload>,
    {
        let mut frames = frames.into_iter();
        let mut pacer = Pacer::new(self.send_rate_hz, self.stats_interval, self.shutdown.clone());
        let mut sent = 0;
        let mut window = RttStats::new();
        loop {
            match pacer.next().await {
                PacerAction::SendNow => {
                    let Some(payload) = frames.next() else {
                        info!("frame source exhausted");
                        break;
                    };
                    match self.producer.send_frame(payload).await {
                        Ok(_) => sent += 1,
                        Err(e) => warn!(error = %e, "skipping frame"),
                    }
                }
                PacerAction::Report => {
                    while let Ok(sample) = self.samples.try_recv() {
                        window.record(sample.rtt);
                    }
                    let summary = self.producer.summary();
                    info!(
                        frames_sent = summary.frames_sent,
                        chunks_sent = summary.chunks_sent,
                        pending = self.producer.pending().len(),
                        "producer stats; {window}"
                    );
                    window = RttStats::new();
                }
                PacerAction::Shutdown => break,
            }
        }
        sent
    }

    /// Wait up to `grace` for outstanding acknowledgements.
    ///
    /// Returns `true` when nothing is left pending.
    pub async fn settle(&mut self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while !self.producer.pending().is_empty() {
            match timeout_at(deadline, self.samples.recv()).await {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            }
        }
        self.producer.pending().is_empty()
    }

    /// Stop the ack listener, waiting at most the configured join timeout,
    /// and return the final summary.
    pub async fn shutdown(self) -> SenderSummary {
        self.shutdown.cancel();
        let acks = self.listener.join(self.join_timeout).await;
        let mut summary = *self.producer.summary();
        let still_pending = self.producer.pending().len() as u64;
        match acks {
            Some(acks) => summary.absorb_acks(&acks, still_pending),
            None => summary.unacknowledged = still_pending,
        }
        info!(%summary, "producer stopped");
        summary
    }
}
