//! Error and status types emitted by the fragmentation layer.

use thiserror::Error;

use super::ChunkIndex;
use crate::frame::FrameId;

/// Result of feeding a chunk into a [`Reassembler`](crate::fragment::Reassembler).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkStatus {
    /// The chunk belongs to a frame that was already finalized.
    Stale,
    /// The chunk belongs to an older frame that is no longer being collected.
    Late,
    /// The chunk index was already present; the first copy is kept.
    Duplicate,
    /// The chunk disagrees with the first chunk of its frame on the chunk
    /// count or layout, or its index lies past the frame's chunk count.
    Inconsistent,
    /// The chunk was stored.
    Accepted,
}

/// Errors produced while fragmenting outbound frames.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The frame has no rows and empty frames are not permitted.
    #[error("frame {frame_id} has no rows")]
    EmptyFrame { frame_id: FrameId },
    /// The chunk index cannot advance because it would overflow `u32`.
    #[error("chunk index overflow after {last}")]
    IndexOverflow { last: ChunkIndex },
}
