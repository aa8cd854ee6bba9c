//! Single-packet stream sender.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, StreamSenderConfig},
    error::FramecastError,
    feedback::{
        ListenerOptions,
        ListenerTask,
        ReportHandler,
        ReportSample,
        ReportTracker,
        report::newest,
        unix_timestamp,
    },
    runtime::{BackoffConfig, Pacer, PacerAction},
    stats::StreamSenderSummary,
    transport::{Transport, UdpTransport},
    wire::{StreamPacket, WireError},
};

/// Stamps frames with a sequence number and send time and sends each as one
/// datagram.
#[derive(Debug)]
pub struct StreamSender<T> {
    data: T,
    name: String,
    next_sequence: u64,
    summary: StreamSenderSummary,
}

impl<T: Transport> StreamSender<T> {
    /// Create a sender labelling every packet with `name`.
    #[must_use]
    pub fn new(data: T, name: impl Into<String>) -> Self {
        Self {
            data,
            name: name.into(),
            next_sequence: 0,
            summary: StreamSenderSummary::default(),
        }
    }

    /// Sequence number the next packet will carry.
    #[must_use]
    pub const fn next_sequence(&self) -> u64 { self.next_sequence }

    #[must_use]
    pub const fn summary(&self) -> &StreamSenderSummary { &self.summary }

    /// Send `payload` as the next packet and return its sequence number.
    ///
    /// A failed send still consumes the sequence number, so the receiver
    /// counts the packet as lost.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidField`] if the packet cannot be encoded.
    pub async fn send(&mut self, payload: &[u8]) -> Result<u64, WireError> {
        let sequence = self.next_sequence;
        let datagram = StreamPacket {
            sequence,
            send_timestamp: unix_timestamp(),
            name: &self.name,
            payload,
        }
        .encode()?;
        self.next_sequence += 1;
        match self.data.send(&datagram).await {
            Ok(()) => {
                self.summary.packets_sent += 1;
                self.summary.bytes_sent += datagram.len() as u64;
                debug!(sequence, bytes = datagram.len(), "packet sent");
            }
            Err(e) => {
                self.summary.send_errors += 1;
                warn!(sequence, error = %e, "failed to send packet");
            }
        }
        Ok(sequence)
    }
}

/// A [`StreamSender`] driven at a fixed rate with a background report
/// listener.
#[derive(Debug)]
pub struct StreamSenderRuntime<T> {
    sender: StreamSender<T>,
    shutdown: CancellationToken,
    listener: ListenerTask<ReportTracker>,
    reports: mpsc::UnboundedReceiver<ReportSample>,
    latest: Option<ReportSample>,
    send_rate_hz: f64,
    stats_interval: Duration,
    join_timeout: Duration,
}

impl StreamSenderRuntime<UdpTransport> {
    /// Connect the data socket and bind the feedback socket.
    ///
    /// # Errors
    ///
    /// Returns [`FramecastError::Config`] for invalid settings and
    /// [`FramecastError::Transport`] if a socket cannot be set up.
    pub async fn connect(config: &StreamSenderConfig) -> Result<Self, FramecastError> {
        config.validate()?;
        let data = UdpTransport::connect_from(config.data_bind, config.data_peer).await?;
        let feedback = UdpTransport::bind(config.feedback_bind).await?;
        Ok(Self::start(config, data, feedback)?)
    }
}

impl<T: Transport> StreamSenderRuntime<T> {
    /// Validate `config` and spawn the report listener on `feedback`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for out-of-range settings.
    pub fn start<F>(config: &StreamSenderConfig, data: T, feedback: F) -> Result<Self, ConfigError>
    where
        F: Transport + 'static,
    {
        config.validate()?;
        let shutdown = CancellationToken::new();
        let (listener, reports) = ListenerTask::spawn(
            feedback,
            ReportHandler::new(),
            ListenerOptions {
                shutdown: shutdown.child_token(),
                backoff: BackoffConfig::default(),
                tick_every: config.stats_interval(),
            },
        );
        info!(rate_hz = config.send_rate_hz, name = %config.name, "stream sender started");
        Ok(Self {
            sender: StreamSender::new(data, config.name.clone()),
            shutdown,
            listener,
            reports,
            latest: None,
            send_rate_hz: config.send_rate_hz,
            stats_interval: config.stats_interval(),
            join_timeout: config.join_timeout(),
        })
    }

    /// Token that stops [`StreamSenderRuntime::run`] when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }

    #[must_use]
    pub const fn sender(&self) -> &StreamSender<T> { &self.sender }

    /// Feedback report with the highest sequence seen by [`StreamSenderRuntime::run`] or
    /// [`StreamSenderRuntime::drain_reports`].
    #[must_use]
    pub const fn latest_report(&self) -> Option<ReportSample> { self.latest }

    /// Consume queued report samples, returning how many arrived.
    pub fn drain_reports(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(sample) = self.reports.try_recv() {
            self.latest = newest(self.latest, sample);
            drained += 1;
        }
        drained
    }

    /// Send payloads from `frames` at the configured rate until the source
    /// is exhausted or shutdown is requested.
    ///
    /// Returns the number of packets sent.
    pub async fn run<I>(&mut self, frames: I) -> u64
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mut frames = frames.into_iter();
        let mut pacer = Pacer::new(self.send_rate_hz, self.stats_interval, self.shutdown.clone());
        let mut sent = 0;
        loop {
            match pacer.next().await {
                PacerAction::SendNow => {
                    let Some(payload) = frames.next() else {
                        info!("frame source exhausted");
                        break;
                    };
                    match self.sender.send(&payload).await {
                        Ok(_) => sent += 1,
                        Err(e) => warn!(error = %e, "skipping frame"),
                    }
                }
                PacerAction::Report => {
                    self.drain_reports();
                    let summary = self.sender.summary();
                    match self.latest {
                        Some(report) => info!(
                            packets_sent = summary.packets_sent,
                            rtt_ms = report.rtt.as_secs_f64() * 1e3,
                            receiver_loss = report.loss_rate(),
                            "stream sender stats"
                        ),
                        None => info!(
                            packets_sent = summary.packets_sent,
                            "stream sender stats; no feedback yet"
                        ),
                    }
                }
                PacerAction::Shutdown => break,
            }
        }
        sent
    }

    /// Stop the report listener, waiting at most the configured join
    /// timeout, and return the final summary.
    pub async fn shutdown(self) -> StreamSenderSummary {
        self.shutdown.cancel();
        let mut summary = *self.sender.summary();
        if let Some(tracker) = self.listener.join(self.join_timeout).await {
            summary.reports = tracker.rtt().samples();
            summary.reports_rejected = tracker.rejected();
            summary.loss_rate = tracker.loss_rate();
            summary.rtt = *tracker.rtt();
        }
        info!(%summary, "stream sender stopped");
        summary
    }
}
