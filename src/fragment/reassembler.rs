//! Inbound engine that stitches chunks back into frames.
//!
//! [`Reassembler`] tolerates loss, duplication and reordering of chunks. A
//! frame is finalized when its terminal chunk arrives, when a chunk of a newer
//! frame arrives, when the buffer exceeds the configured lag, or on shutdown.
//! Finalization always emits whatever was received, so a lost chunk costs part
//! of one frame and never stalls the stream.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    num::NonZeroUsize,
};

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use super::{Chunk, ChunkHeader, ChunkIndex, ChunkLayout, ChunkStatus};
use crate::frame::{FrameId, Payload, PointBlock};

/// Default number of frames that may be buffered at once.
pub const DEFAULT_MAX_FRAME_LAG: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(lag) => lag,
    None => unreachable!(),
};

#[derive(Debug)]
struct PartialFrame {
    total_chunks: u32,
    layout: ChunkLayout,
    received: BTreeMap<ChunkIndex, Bytes>,
}

impl PartialFrame {
    fn new(header: &ChunkHeader) -> Self {
        Self {
            total_chunks: header.total_chunks(),
            layout: header.layout(),
            received: BTreeMap::new(),
        }
    }

    /// Store `payload` unless the header contradicts the frame's first chunk.
    fn insert(&mut self, header: &ChunkHeader, payload: Bytes) -> ChunkStatus {
        if header.total_chunks() != self.total_chunks
            || header.layout() != self.layout
            || header.chunk_index().get() >= self.total_chunks
        {
            return ChunkStatus::Inconsistent;
        }
        match self.received.entry(header.chunk_index()) {
            Entry::Vacant(vacant) => {
                vacant.insert(payload);
                ChunkStatus::Accepted
            }
            Entry::Occupied(_) => ChunkStatus::Duplicate,
        }
    }

    fn assemble(self, frame_id: FrameId, reason: FinalizeReason) -> AssembledFrame {
        let received_chunks = u32::try_from(self.received.len()).unwrap_or(u32::MAX);
        let len = self.received.values().map(Bytes::len).sum();
        let mut buf = BytesMut::with_capacity(len);
        for bytes in self.received.into_values() {
            buf.extend_from_slice(&bytes);
        }
        let bytes = buf.freeze();

        let (payload, integrity) = match self.layout {
            ChunkLayout::Opaque => (Payload::Opaque(bytes), Integrity::Intact),
            ChunkLayout::Points { element, row_width } => {
                match PointBlock::new(element, row_width, bytes.clone()) {
                    Ok(block) => (Payload::Points(block), Integrity::Intact),
                    Err(err) => {
                        warn!(
                            frame_id = %frame_id,
                            len = err.len,
                            row_size = err.row_size,
                            "assembled frame is not a whole number of rows; forwarding raw bytes"
                        );
                        (
                            Payload::Opaque(bytes),
                            Integrity::Misaligned {
                                len: err.len,
                                row_size: err.row_size,
                            },
                        )
                    }
                }
            }
        };

        AssembledFrame {
            frame_id,
            payload,
            received_chunks,
            total_chunks: self.total_chunks,
            integrity,
            reason,
        }
    }
}

/// Why a frame left the reassembly buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizeReason {
    /// Its terminal chunk arrived.
    Marker,
    /// A chunk of a newer frame arrived.
    NextFrame,
    /// The buffer exceeded the configured lag.
    Overflow,
    /// The caller requested it explicitly.
    Requested,
    /// The consumer flushed its buffer while shutting down.
    Shutdown,
}

/// Whether the assembled bytes matched the declared row layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Integrity {
    Intact,
    /// The byte count was not a multiple of the row size; the payload is
    /// forwarded as [`Payload::Opaque`].
    Misaligned { len: usize, row_size: usize },
}

/// A finalized, possibly partial, frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledFrame {
    frame_id: FrameId,
    payload: Payload,
    received_chunks: u32,
    total_chunks: u32,
    integrity: Integrity,
    reason: FinalizeReason,
}

impl AssembledFrame {
    #[must_use]
    pub const fn frame_id(&self) -> FrameId { self.frame_id }

    #[must_use]
    pub const fn payload(&self) -> &Payload { &self.payload }

    /// Number of distinct chunks that contributed to the payload.
    #[must_use]
    pub const fn received_chunks(&self) -> u32 { self.received_chunks }

    /// Number of chunks the producer declared.
    #[must_use]
    pub const fn total_chunks(&self) -> u32 { self.total_chunks }

    /// Whether every declared chunk was received.
    #[must_use]
    pub const fn is_complete(&self) -> bool { self.received_chunks == self.total_chunks }

    #[must_use]
    pub const fn integrity(&self) -> Integrity { self.integrity }

    #[must_use]
    pub const fn reason(&self) -> FinalizeReason { self.reason }

    /// Consume the frame, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Payload { self.payload }
}

/// Outcome of [`Reassembler::push`].
#[derive(Debug)]
pub struct PushOutcome {
    /// What happened to the pushed chunk itself.
    pub status: ChunkStatus,
    /// Frames finalized as a consequence, oldest first.
    pub finalized: Vec<AssembledFrame>,
}

/// Stateful chunk reassembler with bounded lag.
///
/// All state lives in the instance: a single receive loop owns it and no
/// locking is involved.
#[derive(Debug)]
pub struct Reassembler {
    max_lag: NonZeroUsize,
    buffers: BTreeMap<FrameId, PartialFrame>,
    current: Option<FrameId>,
    last_processed: Option<FrameId>,
}

impl Default for Reassembler {
    fn default() -> Self { Self::new(DEFAULT_MAX_FRAME_LAG) }
}

impl Reassembler {
    /// Create a reassembler that buffers at most `max_lag` frames.
    #[must_use]
    pub fn new(max_lag: NonZeroUsize) -> Self {
        Self {
            max_lag,
            buffers: BTreeMap::new(),
            current: None,
            last_processed: None,
        }
    }

    #[must_use]
    pub const fn max_lag(&self) -> NonZeroUsize { self.max_lag }

    /// Frame currently being collected.
    #[must_use]
    pub const fn current_frame(&self) -> Option<FrameId> { self.current }

    /// Highest frame finalized so far. Never decreases.
    #[must_use]
    pub const fn last_processed(&self) -> Option<FrameId> { self.last_processed }

    /// Number of partial frames currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffers.len() }

    /// Feed a chunk into the engine.
    ///
    /// The returned outcome lists every frame finalized by this chunk,
    /// oldest first. Each of them should be acknowledged exactly once.
    pub fn push(&mut self, chunk: Chunk) -> PushOutcome {
        let (header, payload) = chunk.into_parts();
        let frame_id = header.frame_id();

        if self.last_processed.is_some_and(|last| frame_id <= last) {
            debug!(frame_id = %frame_id, chunk_index = %header.chunk_index(), "discarding stale chunk");
            return PushOutcome {
                status: ChunkStatus::Stale,
                finalized: Vec::new(),
            };
        }

        let mut finalized = Vec::new();
        if self.current.is_none_or(|current| frame_id > current) {
            if let Some(current) = self.current {
                finalized.extend(self.finalize_with(current, FinalizeReason::NextFrame));
            }
            let older: Vec<FrameId> = self.buffers.range(..frame_id).map(|(id, _)| *id).collect();
            for id in older {
                finalized.extend(self.finalize_with(id, FinalizeReason::NextFrame));
            }
            self.current = Some(frame_id);
        }

        let status = if self.current == Some(frame_id) {
            let status = self
                .buffers
                .entry(frame_id)
                .or_insert_with(|| PartialFrame::new(&header))
                .insert(&header, payload);
            if status == ChunkStatus::Inconsistent {
                warn!(
                    frame_id = %frame_id,
                    chunk_index = %header.chunk_index(),
                    total_chunks = header.total_chunks(),
                    "discarding chunk that contradicts its frame's layout"
                );
            } else if header.is_terminal() {
                finalized.extend(self.finalize_with(frame_id, FinalizeReason::Marker));
            }
            status
        } else {
            debug!(frame_id = %frame_id, "discarding chunk of a frame no longer collected");
            ChunkStatus::Late
        };

        while self.buffers.len() > self.max_lag.get() {
            let Some((oldest, partial)) = self.buffers.pop_first() else {
                break;
            };
            finalized.push(self.complete(oldest, partial, FinalizeReason::Overflow));
        }

        PushOutcome { status, finalized }
    }

    /// Finalize `frame_id` now, emitting whatever has been received.
    ///
    /// Returns `None` when the frame is not buffered.
    pub fn finalize(&mut self, frame_id: FrameId) -> Option<AssembledFrame> {
        self.finalize_with(frame_id, FinalizeReason::Requested)
    }

    /// Finalize every buffered frame in ascending id order.
    pub fn flush(&mut self) -> Vec<AssembledFrame> {
        let buffers = std::mem::take(&mut self.buffers);
        buffers
            .into_iter()
            .map(|(id, partial)| self.complete(id, partial, FinalizeReason::Shutdown))
            .collect()
    }

    /// Drop every buffered frame without emitting it.
    ///
    /// Returns the identifiers that were dropped.
    pub fn discard(&mut self) -> Vec<FrameId> {
        let dropped = self.buffers.keys().copied().collect();
        self.buffers.clear();
        dropped
    }

    fn finalize_with(&mut self, frame_id: FrameId, reason: FinalizeReason) -> Option<AssembledFrame> {
        let partial = self.buffers.remove(&frame_id)?;
        Some(self.complete(frame_id, partial, reason))
    }

    fn complete(
        &mut self,
        frame_id: FrameId,
        partial: PartialFrame,
        reason: FinalizeReason,
    ) -> AssembledFrame {
        self.last_processed = Some(self.last_processed.map_or(frame_id, |last| last.max(frame_id)));
        partial.assemble(frame_id, reason)
    }
}
