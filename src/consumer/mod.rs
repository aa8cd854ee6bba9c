//! Chunked frame consumer.
//!
//! A [`Consumer`] owns the data transport and a [`Reassembler`]. Every
//! datagram is decoded and pushed into the engine; each frame the engine
//! finalizes is delivered over a channel and acknowledged to the producer.
//! All reassembly happens on the consumer's own task, so no locking is
//! involved.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, ConsumerConfig, ShutdownPolicy},
    error::FramecastError,
    fragment::{AssembledFrame, ChunkStatus, FinalizeReason, Integrity, Reassembler},
    frame::FrameId,
    metrics::{self, Direction},
    runtime::{BackoffConfig, LoopEvent, ReceiveLoop},
    stats::ReceiverSummary,
    transport::{MAX_DATAGRAM_SIZE, Transport, UdpTransport},
    wire::{decode_chunk, encode_ack},
};

/// Receives chunks, reassembles frames, and acknowledges them.
#[derive(Debug)]
pub struct Consumer<D, F> {
    data: D,
    feedback: F,
    reassembler: Reassembler,
    frames: mpsc::Sender<AssembledFrame>,
    policy: ShutdownPolicy,
    stats_interval: Duration,
    backoff: BackoffConfig,
    summary: ReceiverSummary,
}

impl Consumer<UdpTransport, UdpTransport> {
    /// Bind the data socket, joining the multicast group if one is
    /// configured, and connect the feedback socket.
    ///
    /// # Errors
    ///
    /// Returns [`FramecastError::Config`] for invalid settings and
    /// [`FramecastError::Transport`] if a socket cannot be set up.
    pub async fn bind(
        config: &ConsumerConfig,
    ) -> Result<(Self, mpsc::Receiver<AssembledFrame>), FramecastError> {
        config.validate()?;
        let data = UdpTransport::bind(config.data_bind).await?;
        if let Some(group) = config.multicast_group {
            data.join_multicast_v4(group, config.multicast_interface)?;
        }
        let feedback = UdpTransport::connect(config.feedback_peer).await?;
        Ok(Self::new(config, data, feedback)?)
    }
}

impl<D: Transport, F: Transport> Consumer<D, F> {
    /// Create a consumer reading chunks from `data` and sending acks on
    /// `feedback`.
    ///
    /// Returns the consumer and the receiving end of its delivery channel.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for out-of-range settings.
    pub fn new(
        config: &ConsumerConfig,
        data: D,
        feedback: F,
    ) -> Result<(Self, mpsc::Receiver<AssembledFrame>), ConfigError> {
        config.validate()?;
        let (frames, rx) = mpsc::channel(config.delivery_capacity);
        let consumer = Self {
            data,
            feedback,
            reassembler: Reassembler::new(config.max_frame_lag()?),
            frames,
            policy: config.shutdown_policy,
            stats_interval: config.stats_interval(),
            backoff: BackoffConfig::default(),
            summary: ReceiverSummary::default(),
        };
        Ok((consumer, rx))
    }

    /// Override the receive back-off.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub const fn summary(&self) -> &ReceiverSummary { &self.summary }

    #[must_use]
    pub const fn reassembler(&self) -> &Reassembler { &self.reassembler }

    /// Receive until `shutdown` is cancelled, then apply the shutdown
    /// policy to whatever is still buffered.
    pub async fn run(mut self, shutdown: CancellationToken) -> ReceiverSummary {
        info!(
            max_frame_lag = self.reassembler.max_lag().get(),
            policy = ?self.policy,
            "consumer started"
        );
        let mut rx = ReceiveLoop::new(shutdown, self.backoff, self.stats_interval);
        let mut buf = vec![0_u8; MAX_DATAGRAM_SIZE];
        loop {
            match rx.next(&self.data, &mut buf).await {
                LoopEvent::Datagram(len) => self.handle_datagram(&buf[..len]).await,
                LoopEvent::Tick => info!(
                    summary = %self.summary,
                    buffered = self.reassembler.buffered_len(),
                    "consumer stats"
                ),
                LoopEvent::Shutdown => break,
            }
        }
        self.stop().await
    }

    /// Process one datagram.
    ///
    /// Malformed datagrams are logged and counted; they never change the
    /// reassembly state.
    pub async fn handle_datagram(&mut self, datagram: &[u8]) {
        let chunk = match decode_chunk(datagram) {
            Ok(chunk) => chunk,
            Err(e) => {
                self.summary.malformed_datagrams += 1;
                metrics::inc_malformed(e.kind());
                warn!(error = %e, len = datagram.len(), "discarding malformed chunk datagram");
                return;
            }
        };
        self.summary.chunks_received += 1;
        metrics::inc_chunks(Direction::Inbound);
        debug!(
            frame_id = %chunk.header().frame_id(),
            chunk_index = %chunk.header().chunk_index(),
            total_chunks = chunk.header().total_chunks(),
            "chunk received"
        );

        let outcome = self.reassembler.push(chunk);
        match outcome.status {
            ChunkStatus::Stale => {
                self.summary.stale_chunks += 1;
                metrics::inc_chunks_stale();
            }
            ChunkStatus::Late => self.summary.late_chunks += 1,
            ChunkStatus::Duplicate => self.summary.duplicate_chunks += 1,
            ChunkStatus::Inconsistent => self.summary.inconsistent_chunks += 1,
            ChunkStatus::Accepted => {}
        }
        for frame in outcome.finalized {
            self.deliver(frame).await;
        }
    }

    async fn stop(mut self) -> ReceiverSummary {
        match self.policy {
            ShutdownPolicy::Flush => {
                for frame in self.reassembler.flush() {
                    self.deliver(frame).await;
                }
            }
            ShutdownPolicy::Discard => {
                let dropped = self.reassembler.discard();
                self.summary.frames_discarded += dropped.len() as u64;
                if !dropped.is_empty() {
                    info!(count = dropped.len(), "discarded partial frames at shutdown");
                }
            }
        }
        info!(summary = %self.summary, "consumer stopped");
        self.summary
    }

    async fn deliver(&mut self, frame: AssembledFrame) {
        let frame_id = frame.frame_id();
        let complete = frame.is_complete();
        if complete {
            self.summary.frames_complete += 1;
            info!(
                %frame_id,
                bytes = frame.payload().byte_len(),
                chunks = frame.total_chunks(),
                "frame complete"
            );
        } else {
            self.summary.frames_partial += 1;
            warn!(
                %frame_id,
                received = frame.received_chunks(),
                total = frame.total_chunks(),
                reason = ?frame.reason(),
                "frame incomplete"
            );
        }
        if matches!(frame.integrity(), Integrity::Misaligned { .. }) {
            self.summary.frames_misaligned += 1;
        }
        if frame.reason() == FinalizeReason::Overflow {
            self.summary.frames_evicted += 1;
            metrics::inc_frames_evicted();
        }
        metrics::inc_frames_finalized(complete);

        match self.frames.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.summary.frames_dropped += 1;
                warn!(%frame_id, "delivery queue full; dropping frame");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%frame_id, "frame receiver dropped; frame not delivered");
            }
        }
        self.acknowledge(frame_id).await;
    }

    async fn acknowledge(&mut self, frame_id: FrameId) {
        let result = match encode_ack(frame_id) {
            Ok(ack) => self.feedback.send(&ack).await.map_err(FramecastError::from),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            self.summary.ack_errors += 1;
            warn!(%frame_id, error = %e, "failed to send ack");
        }
    }
}
