//! Chunk datagrams.
//!
//! A chunk datagram is the marker [`CHUNK_MARKER`] followed by a bincode
//! record (standard configuration) holding the header fields and the chunk
//! bytes:
//!
//! `[FCHK][frame_id][chunk_index][total_chunks][element_type][row_width][is_terminal][payload]`

use std::num::NonZeroUsize;

use bincode::{BorrowDecode, Encode, borrow_decode_from_slice, config, encode_to_vec};
use bytes::Bytes;

use super::{WireError, strip_marker};
use crate::{
    fragment::{Chunk, ChunkHeader, ChunkIndex, ChunkLayout, OPAQUE_TAG},
    frame::{ElementType, FrameId, RowWidth},
};

/// Marker that prefixes every chunk datagram.
pub const CHUNK_MARKER: &[u8; 4] = b"FCHK";

#[derive(Encode, BorrowDecode)]
struct ChunkRecord<'a> {
    frame_id: u64,
    chunk_index: u32,
    total_chunks: u32,
    element_type: &'a str,
    row_width: u8,
    is_terminal: bool,
    payload: &'a [u8],
}

/// Worst-case bytes a chunk datagram adds on top of its payload, for
/// payloads up to `u16::MAX` bytes.
///
/// # Panics
///
/// Panics if encoding the worst-case record fails, which would indicate
/// a programmer error.
#[must_use]
pub fn chunk_overhead() -> NonZeroUsize {
    let widest = ChunkRecord {
        frame_id: u64::MAX,
        chunk_index: u32::MAX,
        total_chunks: u32::MAX,
        element_type: ElementType::F64.tag(),
        row_width: RowWidth::Xyzi.get(),
        is_terminal: true,
        payload: &[],
    };
    let encoded = encode_to_vec(&widest, config::standard())
        .unwrap_or_else(|err| panic!("worst-case chunk encoding must be infallible: {err}"));
    // An empty payload needs a one-byte length; up to u16::MAX needs three.
    let overhead = CHUNK_MARKER.len() + encoded.len() + 2;
    NonZeroUsize::new(overhead)
        .unwrap_or_else(|| panic!("chunk overhead must be non-zero (computed {overhead})"))
}

/// Encode a chunk into a datagram.
///
/// # Errors
///
/// Returns [`WireError::Encode`] if the record cannot be encoded.
pub fn encode_chunk(chunk: &Chunk) -> Result<Vec<u8>, WireError> {
    let header = chunk.header();
    let layout = header.layout();
    let record = ChunkRecord {
        frame_id: header.frame_id().get(),
        chunk_index: header.chunk_index().get(),
        total_chunks: header.total_chunks(),
        element_type: layout.element_tag(),
        row_width: layout.row_width_byte(),
        is_terminal: header.is_terminal(),
        payload: chunk.payload(),
    };
    let body = encode_to_vec(&record, config::standard())?;

    let mut buf = Vec::with_capacity(CHUNK_MARKER.len() + body.len());
    buf.extend_from_slice(CHUNK_MARKER);
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode a chunk datagram, validating header invariants.
///
/// # Errors
///
/// Returns [`WireError`] when the marker is missing, the record is malformed
/// or truncated, `chunk_index >= total_chunks`, or the layout fields are
/// unknown.
pub fn decode_chunk(datagram: &[u8]) -> Result<Chunk, WireError> {
    let body = strip_marker(datagram, CHUNK_MARKER, "FCHK")?;
    let (record, consumed) = borrow_decode_from_slice::<ChunkRecord<'_>, _>(body, config::standard())?;
    if consumed != body.len() {
        return Err(WireError::TrailingBytes(body.len() - consumed));
    }
    if record.total_chunks == 0 {
        return Err(WireError::InvalidField("total_chunks must be positive"));
    }
    if record.chunk_index >= record.total_chunks {
        return Err(WireError::InvalidField("chunk_index must be below total_chunks"));
    }

    let layout = parse_layout(record.element_type, record.row_width)?;
    let header = ChunkHeader::new(
        FrameId::new(record.frame_id),
        ChunkIndex::new(record.chunk_index),
        record.total_chunks,
        layout,
        record.is_terminal,
    );
    Ok(Chunk::new(header, Bytes::copy_from_slice(record.payload)))
}

fn parse_layout(tag: &str, row_width: u8) -> Result<ChunkLayout, WireError> {
    if tag == OPAQUE_TAG {
        return if row_width == 0 {
            Ok(ChunkLayout::Opaque)
        } else {
            Err(WireError::InvalidField("opaque chunks must declare row width 0"))
        };
    }
    let element =
        ElementType::from_tag(tag).ok_or_else(|| WireError::UnknownElementType(tag.to_owned()))?;
    Ok(ChunkLayout::Points {
        element,
        row_width: RowWidth::try_from(row_width)?,
    })
}
