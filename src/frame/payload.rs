//! Frame payloads: opaque byte blobs and row-structured point blocks.

use std::ops::Range;

use bytes::{Bytes, BytesMut};
use thiserror::Error;

use super::{ElementType, FrameId, RowWidth};

/// Raised when a byte buffer does not hold a whole number of rows.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{len} bytes is not a whole number of {row_size}-byte rows")]
pub struct MisalignedRows {
    pub len: usize,
    pub row_size: usize,
}

/// A block of fixed-width point rows sharing one element type.
///
/// The data buffer always holds `row_count * row_size` bytes, with elements
/// stored little-endian in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointBlock {
    element: ElementType,
    row_width: RowWidth,
    data: Bytes,
}

impl PointBlock {
    /// Wrap `data` as rows of `row_width` elements of type `element`.
    ///
    /// # Errors
    ///
    /// Returns [`MisalignedRows`] when `data` is not a multiple of the row
    /// size.
    pub fn new(
        element: ElementType,
        row_width: RowWidth,
        data: impl Into<Bytes>,
    ) -> Result<Self, MisalignedRows> {
        let data = data.into();
        let row_size = element.size() * row_width.columns();
        if data.len() % row_size != 0 {
            return Err(MisalignedRows {
                len: data.len(),
                row_size,
            });
        }
        Ok(Self {
            element,
            row_width,
            data,
        })
    }

    /// Build an `f32` block from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`MisalignedRows`] when `values` is not a whole number of rows.
    pub fn from_f32_rows(row_width: RowWidth, values: &[f32]) -> Result<Self, MisalignedRows> {
        let mut data = BytesMut::with_capacity(values.len() * ElementType::F32.size());
        for value in values {
            data.extend_from_slice(&value.to_le_bytes());
        }
        Self::new(ElementType::F32, row_width, data.freeze())
    }

    /// A block with zero rows.
    #[must_use]
    pub fn empty(element: ElementType, row_width: RowWidth) -> Self {
        Self {
            element,
            row_width,
            data: Bytes::new(),
        }
    }

    /// Element type shared by every value in the block.
    #[must_use]
    pub const fn element_type(&self) -> ElementType { self.element }

    /// Number of columns in each row.
    #[must_use]
    pub const fn row_width(&self) -> RowWidth { self.row_width }

    /// Size of a single row in bytes.
    #[must_use]
    pub const fn row_size(&self) -> usize { self.element.size() * self.row_width.columns() }

    /// Number of rows held by the block.
    #[must_use]
    pub fn row_count(&self) -> usize { self.data.len() / self.row_size() }

    /// Whether the block holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Raw row-major bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.data }

    /// Iterate over rows as byte slices.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> { self.data.chunks_exact(self.row_size()) }

    /// Cheaply slice out the bytes of `rows`.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past [`PointBlock::row_count`].
    #[must_use]
    pub fn slice_rows(&self, rows: Range<usize>) -> Bytes {
        let row_size = self.row_size();
        self.data.slice(rows.start * row_size..rows.end * row_size)
    }

    /// Decode the block as `f32` values, or `None` for other element types.
    #[must_use]
    pub fn f32_values(&self) -> Option<Vec<f32>> {
        if self.element != ElementType::F32 {
            return None;
        }
        let values = self
            .data
            .chunks_exact(ElementType::F32.size())
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect();
        Some(values)
    }

    /// Consume the block, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.data }
}

/// Content of a single frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Bytes with no row structure. Always sent as a single chunk.
    Opaque(Bytes),
    /// Fixed-width rows. Split at row granularity.
    Points(PointBlock),
}

impl Payload {
    /// Total payload size in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Opaque(bytes) => bytes.len(),
            Self::Points(block) => block.as_bytes().len(),
        }
    }

    /// Whether the payload carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.byte_len() == 0 }

    /// Borrow the point block when the payload is row-structured.
    #[must_use]
    pub fn as_points(&self) -> Option<&PointBlock> {
        match self {
            Self::Points(block) => Some(block),
            Self::Opaque(_) => None,
        }
    }

    /// Raw bytes of the payload, dropping any row structure.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Opaque(bytes) => bytes,
            Self::Points(block) => block.into_bytes(),
        }
    }
}

impl From<PointBlock> for Payload {
    fn from(value: PointBlock) -> Self { Self::Points(value) }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self { Self::Opaque(value) }
}

/// A sensor frame tagged with its identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    id: FrameId,
    payload: Payload,
}

impl Frame {
    /// Construct a frame.
    #[must_use]
    pub fn new(id: FrameId, payload: impl Into<Payload>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    /// Frame identifier.
    #[must_use]
    pub const fn id(&self) -> FrameId { self.id }

    /// Borrow the payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload { &self.payload }

    /// Consume the frame, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (FrameId, Payload) { (self.id, self.payload) }
}
