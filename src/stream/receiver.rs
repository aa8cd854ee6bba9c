//! Single-packet stream receiver.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, StreamReceiverConfig},
    error::FramecastError,
    metrics,
    runtime::{BackoffConfig, LoopEvent, ReceiveLoop},
    sequence::{SequenceStatus, SequenceTracker},
    stats::StreamReceiverSummary,
    transport::{MAX_DATAGRAM_SIZE, Transport, UdpTransport},
    wire::{FeedbackReport, decode_stream_packet},
};

/// A packet handed to the application.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamDelivery {
    pub sequence: u64,
    /// Sender's wall-clock stamp, in seconds since the UNIX epoch.
    pub send_timestamp: f64,
    pub name: String,
    pub payload: Bytes,
    /// Packets skipped immediately before this one.
    pub lost_before: u64,
}

/// Receives stream packets, detects loss, and reports back to the sender.
#[derive(Debug)]
pub struct StreamReceiver<D, F> {
    data: D,
    feedback: F,
    tracker: SequenceTracker,
    deliveries: mpsc::Sender<StreamDelivery>,
    stats_interval: Duration,
    backoff: BackoffConfig,
    summary: StreamReceiverSummary,
}

impl StreamReceiver<UdpTransport, UdpTransport> {
    /// Bind the data socket, joining the multicast group if one is
    /// configured, and connect the feedback socket.
    ///
    /// # Errors
    ///
    /// Returns [`FramecastError::Config`] for invalid settings and
    /// [`FramecastError::Transport`] if a socket cannot be set up.
    pub async fn bind(
        config: &StreamReceiverConfig,
    ) -> Result<(Self, mpsc::Receiver<StreamDelivery>), FramecastError> {
        config.validate()?;
        let data = UdpTransport::bind(config.data_bind).await?;
        if let Some(group) = config.multicast_group {
            data.join_multicast_v4(group, config.multicast_interface)?;
        }
        let feedback = UdpTransport::connect(config.feedback_peer).await?;
        Ok(Self::new(config, data, feedback)?)
    }
}

impl<D: Transport, F: Transport> StreamReceiver<D, F> {
    /// Create a receiver reading packets from `data` and sending reports on
    /// `feedback`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for out-of-range settings.
    pub fn new(
        config: &StreamReceiverConfig,
        data: D,
        feedback: F,
    ) -> Result<(Self, mpsc::Receiver<StreamDelivery>), ConfigError> {
        config.validate()?;
        let (deliveries, rx) = mpsc::channel(config.delivery_capacity);
        let receiver = Self {
            data,
            feedback,
            tracker: SequenceTracker::new(),
            deliveries,
            stats_interval: config.stats_interval(),
            backoff: BackoffConfig::default(),
            summary: StreamReceiverSummary::default(),
        };
        Ok((receiver, rx))
    }

    #[must_use]
    pub const fn tracker(&self) -> &SequenceTracker { &self.tracker }

    /// Counters accumulated so far.
    #[must_use]
    pub fn summary(&self) -> StreamReceiverSummary {
        StreamReceiverSummary {
            packets_received: self.tracker.total_received(),
            packets_lost: self.tracker.total_lost(),
            loss_rate: self.tracker.loss_rate(),
            ..self.summary
        }
    }

    /// Receive until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) -> StreamReceiverSummary {
        info!("stream receiver started");
        let mut rx = ReceiveLoop::new(shutdown, self.backoff, self.stats_interval);
        let mut buf = vec![0_u8; MAX_DATAGRAM_SIZE];
        loop {
            match rx.next(&self.data, &mut buf).await {
                LoopEvent::Datagram(len) => self.handle_datagram(&buf[..len]).await,
                LoopEvent::Tick => info!(summary = %self.summary(), "stream receiver stats"),
                LoopEvent::Shutdown => break,
            }
        }
        let summary = self.summary();
        info!(%summary, "stream receiver stopped");
        summary
    }

    /// Process one datagram: classify its sequence, deliver fresh packets,
    /// and answer each with a feedback report.
    pub async fn handle_datagram(&mut self, datagram: &[u8]) {
        let packet = match decode_stream_packet(datagram) {
            Ok(packet) => packet,
            Err(e) => {
                self.summary.malformed += 1;
                metrics::inc_malformed(e.kind());
                warn!(error = %e, len = datagram.len(), "discarding malformed stream packet");
                return;
            }
        };
        let lost = match self.tracker.observe(packet.sequence) {
            SequenceStatus::Fresh { lost } => lost,
            SequenceStatus::Duplicate => {
                self.summary.duplicates += 1;
                debug!(sequence = packet.sequence, "discarding duplicate or reordered packet");
                return;
            }
        };
        if lost > 0 {
            metrics::add_packets_lost(lost);
            warn!(sequence = packet.sequence, lost, "packets lost");
        }
        self.summary.bytes_received += packet.payload.len() as u64;

        let report = FeedbackReport {
            send_timestamp: packet.send_timestamp,
            sequence: packet.sequence,
            total_received: self.tracker.total_received(),
            total_lost: self.tracker.total_lost(),
        };
        let delivery = StreamDelivery {
            sequence: packet.sequence,
            send_timestamp: packet.send_timestamp,
            name: packet.name.to_owned(),
            payload: Bytes::copy_from_slice(packet.payload),
            lost_before: lost,
        };
        match self.deliveries.try_send(delivery) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.summary.deliveries_dropped += 1;
                warn!(sequence = report.sequence, "delivery queue full; dropping packet");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(sequence = report.sequence, "delivery receiver dropped");
            }
        }
        if let Err(e) = self.feedback.send(&report.encode()).await {
            self.summary.report_errors += 1;
            warn!(sequence = report.sequence, error = %e, "failed to send feedback report");
        }
    }
}
