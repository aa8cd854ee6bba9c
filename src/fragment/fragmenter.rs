//! Outbound helper that splits frames into datagram-sized chunks.
//!
//! [`Fragmenter`] cuts point blocks at row boundaries so every chunk carries
//! whole rows, and sends opaque payloads as a single chunk. It also owns the
//! producer's [`FrameId`] counter so callers never have to coordinate
//! identifiers themselves.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use super::{ChunkHeader, ChunkIndex, ChunkLayout, FragmentationConfig, FragmentationError};
use crate::frame::{Frame, FrameId, Payload, PointBlock};

/// Splits frames into chunks.
#[derive(Debug)]
pub struct Fragmenter {
    config: FragmentationConfig,
    next_frame_id: AtomicU64,
}

impl Fragmenter {
    /// Create a fragmenter whose first frame id is `0`.
    #[must_use]
    pub const fn new(config: FragmentationConfig) -> Self {
        Self::with_starting_id(config, FrameId::new(0))
    }

    /// Create a fragmenter starting from a specific [`FrameId`].
    #[must_use]
    pub const fn with_starting_id(config: FragmentationConfig, start_at: FrameId) -> Self {
        Self {
            config,
            next_frame_id: AtomicU64::new(start_at.get()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> FragmentationConfig { self.config }

    /// Generate and return the next [`FrameId`].
    ///
    /// # Panics
    ///
    /// Panics if the identifier counter reaches `u64::MAX`.
    #[must_use]
    pub fn next_frame_id(&self) -> FrameId {
        let previous = self
            .next_frame_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(1)
            })
            .unwrap_or_else(|_| panic!("frame id counter exhausted"));
        FrameId::new(previous)
    }

    /// Assign a fresh [`FrameId`] to `payload` and split it into chunks.
    ///
    /// No identifier is consumed when the payload is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::EmptyFrame`] for a point block with no
    /// rows unless empty frames are allowed, or
    /// [`FragmentationError::IndexOverflow`] if more than `u32::MAX` chunks
    /// would be required.
    pub fn fragment_payload(&self, payload: Payload) -> Result<ChunkBatch, FragmentationError> {
        if self.rejects_empty(&payload) {
            let frame_id = FrameId::new(self.next_frame_id.load(Ordering::Relaxed));
            return Err(FragmentationError::EmptyFrame { frame_id });
        }
        let frame = Frame::new(self.next_frame_id(), payload);
        self.fragment(&frame)
    }

    /// Split an already identified frame into chunks.
    ///
    /// # Errors
    ///
    /// See [`Fragmenter::fragment_payload`].
    pub fn fragment(&self, frame: &Frame) -> Result<ChunkBatch, FragmentationError> {
        let frame_id = frame.id();
        let chunks = match frame.payload() {
            Payload::Opaque(bytes) => vec![Chunk::new(
                ChunkHeader::new(frame_id, ChunkIndex::zero(), 1, ChunkLayout::Opaque, true),
                bytes.clone(),
            )],
            Payload::Points(block) => self.split_rows(frame_id, block)?,
        };
        Ok(ChunkBatch::new(frame_id, chunks))
    }

    fn rejects_empty(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Points(block) if block.is_empty())
            && !self.config.allow_empty_frames
    }

    fn split_rows(
        &self,
        frame_id: FrameId,
        block: &PointBlock,
    ) -> Result<Vec<Chunk>, FragmentationError> {
        let layout = ChunkLayout::Points {
            element: block.element_type(),
            row_width: block.row_width(),
        };
        let rows = block.row_count();
        if rows == 0 {
            if !self.config.allow_empty_frames {
                return Err(FragmentationError::EmptyFrame { frame_id });
            }
            let header = ChunkHeader::new(frame_id, ChunkIndex::zero(), 1, layout, true);
            return Ok(vec![Chunk::new(header, Bytes::new())]);
        }

        let max_rows = self.config.max_rows_per_chunk.get();
        let count = rows.div_ceil(max_rows);
        let total = u32::try_from(count).map_err(|_| FragmentationError::IndexOverflow {
            last: ChunkIndex::new(u32::MAX),
        })?;

        let mut chunks = Vec::with_capacity(count);
        let mut index = ChunkIndex::zero();
        let mut start = 0usize;
        while start < rows {
            let end = (start + max_rows).min(rows);
            let is_terminal = end == rows;
            chunks.push(Chunk::new(
                ChunkHeader::new(frame_id, index, total, layout, is_terminal),
                block.slice_rows(start..end),
            ));
            if is_terminal {
                break;
            }
            start = end;
            index = index
                .checked_increment()
                .ok_or(FragmentationError::IndexOverflow { last: index })?;
        }
        Ok(chunks)
    }
}

/// Metadata and payload for a single chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    header: ChunkHeader,
    payload: Bytes,
}

impl Chunk {
    #[must_use]
    pub fn new(header: ChunkHeader, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    #[must_use]
    pub fn header(&self) -> &ChunkHeader { &self.header }

    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the chunk, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (ChunkHeader, Bytes) { (self.header, self.payload) }
}

/// Chunks produced for a single frame, in index order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBatch {
    frame_id: FrameId,
    chunks: Vec<Chunk>,
}

impl ChunkBatch {
    fn new(frame_id: FrameId, chunks: Vec<Chunk>) -> Self {
        debug_assert!(!chunks.is_empty(), "chunk batches must not be empty");
        Self { frame_id, chunks }
    }

    /// The [`FrameId`] shared by all chunks.
    #[must_use]
    pub const fn frame_id(&self) -> FrameId { self.frame_id }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] { self.chunks.as_slice() }

    /// Number of chunks in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.chunks.len() }

    /// Total payload bytes across all chunks.
    #[must_use]
    pub fn payload_len(&self) -> usize { self.chunks.iter().map(|c| c.payload().len()).sum() }

    /// Whether the frame required more than one chunk.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.len() > 1 }

    #[must_use]
    pub fn into_chunks(self) -> Vec<Chunk> { self.chunks }
}

impl IntoIterator for ChunkBatch {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    fn into_iter(self) -> Self::IntoIter { self.chunks.into_iter() }
}
