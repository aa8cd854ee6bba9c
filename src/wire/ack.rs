//! Per-frame acknowledgement datagrams: [`ACK_MARKER`] followed by the
//! bincode-encoded [`FrameId`].

use bincode::{config, decode_from_slice, encode_to_vec};

use super::{WireError, strip_marker};
use crate::frame::FrameId;

/// Marker that prefixes every acknowledgement datagram.
pub const ACK_MARKER: &[u8; 4] = b"FACK";

/// Encode an acknowledgement for `frame_id`.
///
/// # Errors
///
/// Returns [`WireError::Encode`] if the identifier cannot be encoded.
pub fn encode_ack(frame_id: FrameId) -> Result<Vec<u8>, WireError> {
    let body = encode_to_vec(frame_id, config::standard())?;
    let mut buf = Vec::with_capacity(ACK_MARKER.len() + body.len());
    buf.extend_from_slice(ACK_MARKER);
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode an acknowledgement datagram.
///
/// # Errors
///
/// Returns [`WireError`] when the marker is missing or the identifier is
/// malformed.
pub fn decode_ack(datagram: &[u8]) -> Result<FrameId, WireError> {
    let body = strip_marker(datagram, ACK_MARKER, "FACK")?;
    let (frame_id, consumed) = decode_from_slice::<FrameId, _>(body, config::standard())?;
    if consumed != body.len() {
        return Err(WireError::TrailingBytes(body.len() - consumed));
    }
    Ok(frame_id)
}
