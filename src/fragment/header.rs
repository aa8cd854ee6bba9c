//! Chunk metadata shared by the fragmenter, the wire codec and the
//! reassembler.

use super::ChunkIndex;
use crate::frame::{ElementType, FrameId, RowWidth};

/// Wire tag used for chunks that carry opaque bytes.
pub const OPAQUE_TAG: &str = "raw";

/// How the bytes of a chunk should be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkLayout {
    /// Unstructured bytes.
    Opaque,
    /// Whole rows of `row_width` elements of type `element`.
    Points {
        element: ElementType,
        row_width: RowWidth,
    },
}

impl ChunkLayout {
    /// Row size in bytes, or `None` for opaque chunks.
    #[must_use]
    pub const fn row_size(self) -> Option<usize> {
        match self {
            Self::Opaque => None,
            Self::Points { element, row_width } => Some(element.size() * row_width.columns()),
        }
    }

    /// Element type tag as written to the wire.
    #[must_use]
    pub const fn element_tag(self) -> &'static str {
        match self {
            Self::Opaque => OPAQUE_TAG,
            Self::Points { element, .. } => element.tag(),
        }
    }

    /// Row width byte as written to the wire; `0` for opaque chunks.
    #[must_use]
    pub const fn row_width_byte(self) -> u8 {
        match self {
            Self::Opaque => 0,
            Self::Points { row_width, .. } => row_width.get(),
        }
    }
}

/// Header describing a single chunk.
///
/// # Examples
///
/// ```
/// use framecast::{
///     fragment::{ChunkHeader, ChunkIndex, ChunkLayout},
///     frame::FrameId,
/// };
/// let header = ChunkHeader::new(FrameId::new(7), ChunkIndex::zero(), 1, ChunkLayout::Opaque, true);
/// assert_eq!(header.frame_id().get(), 7);
/// assert!(header.is_terminal());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
    frame_id: FrameId,
    chunk_index: ChunkIndex,
    total_chunks: u32,
    layout: ChunkLayout,
    is_terminal: bool,
}

impl ChunkHeader {
    /// Create a new chunk header.
    #[must_use]
    pub const fn new(
        frame_id: FrameId,
        chunk_index: ChunkIndex,
        total_chunks: u32,
        layout: ChunkLayout,
        is_terminal: bool,
    ) -> Self {
        Self {
            frame_id,
            chunk_index,
            total_chunks,
            layout,
            is_terminal,
        }
    }

    #[must_use]
    pub const fn frame_id(&self) -> FrameId { self.frame_id }

    #[must_use]
    pub const fn chunk_index(&self) -> ChunkIndex { self.chunk_index }

    /// Number of chunks the producer split the frame into.
    #[must_use]
    pub const fn total_chunks(&self) -> u32 { self.total_chunks }

    #[must_use]
    pub const fn layout(&self) -> ChunkLayout { self.layout }

    /// Whether this is the last chunk the producer sends for the frame.
    #[must_use]
    pub const fn is_terminal(&self) -> bool { self.is_terminal }
}
