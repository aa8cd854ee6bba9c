//! Chunked frame producer.
//!
//! [`Producer`] turns payloads into chunk datagrams and records each frame's
//! send time for round-trip measurement. [`ProducerRuntime`] adds pacing, the
//! ack listener, periodic statistics, and an orderly shutdown.

mod runtime;

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, warn};

pub use runtime::ProducerRuntime;

use crate::{
    error::FramecastError,
    feedback::PendingAcks,
    fragment::{FragmentationConfig, Fragmenter},
    frame::{FrameId, Payload},
    metrics::{self, Direction},
    stats::SenderSummary,
    transport::Transport,
    wire::encode_chunk,
};

/// Result of emitting one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSend {
    pub frame_id: FrameId,
    /// Chunks the frame was split into.
    pub chunks: usize,
    /// Chunks the transport accepted.
    pub chunks_sent: usize,
    /// Encoded bytes the transport accepted.
    pub bytes_sent: usize,
}

/// Fragments frames and sends their chunks over a data transport.
#[derive(Debug)]
pub struct Producer<T> {
    fragmenter: Fragmenter,
    data: T,
    pending: Arc<PendingAcks>,
    summary: SenderSummary,
}

impl<T: Transport> Producer<T> {
    /// Create a producer writing to `data` and recording send times in
    /// `pending`.
    #[must_use]
    pub fn new(config: FragmentationConfig, data: T, pending: Arc<PendingAcks>) -> Self {
        Self {
            fragmenter: Fragmenter::new(config),
            data,
            pending,
            summary: SenderSummary::default(),
        }
    }

    /// Send times awaiting acknowledgement.
    #[must_use]
    pub fn pending(&self) -> &Arc<PendingAcks> { &self.pending }

    /// Counters accumulated so far. Acknowledgement fields are filled in by
    /// [`ProducerRuntime::shutdown`].
    #[must_use]
    pub const fn summary(&self) -> &SenderSummary { &self.summary }

    /// Fragment `payload` under a fresh frame id and send every chunk.
    ///
    /// The send time is recorded before the first chunk leaves, so an ack
    /// can never overtake its record. Individual send failures are logged
    /// and counted; the remaining chunks are still attempted.
    ///
    /// # Errors
    ///
    /// Returns [`FramecastError::Fragmentation`] for empty payloads that the
    /// configuration rejects and [`FramecastError::Wire`] if a chunk cannot
    /// be encoded. Nothing is sent in either case.
    pub async fn send_frame(&mut self, payload: Payload) -> Result<FrameSend, FramecastError> {
        let batch = self
            .fragmenter
            .fragment_payload(payload)
            .inspect_err(|_| self.summary.frames_rejected += 1)?;
        let frame_id = batch.frame_id();
        let datagrams = batch
            .chunks()
            .iter()
            .map(encode_chunk)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|_| self.summary.frames_rejected += 1)?;

        self.pending.record(frame_id, Instant::now());
        let mut sent = FrameSend {
            frame_id,
            chunks: datagrams.len(),
            chunks_sent: 0,
            bytes_sent: 0,
        };
        for (index, datagram) in datagrams.iter().enumerate() {
            match self.data.send(datagram).await {
                Ok(()) => {
                    sent.chunks_sent += 1;
                    sent.bytes_sent += datagram.len();
                    metrics::inc_chunks(Direction::Outbound);
                }
                Err(e) => {
                    self.summary.send_errors += 1;
                    warn!(%frame_id, chunk_index = index, error = %e, "failed to send chunk");
                }
            }
        }

        self.summary.frames_sent += 1;
        self.summary.chunks_sent += sent.chunks_sent as u64;
        self.summary.bytes_sent += sent.bytes_sent as u64;
        debug!(
            %frame_id,
            chunks = sent.chunks,
            bytes = sent.bytes_sent,
            "frame sent"
        );
        Ok(sent)
    }
}

#[cfg(test)]
mod tests;
