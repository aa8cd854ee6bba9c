//! Datagram encodings.
//!
//! Four message kinds share the wire:
//!
//! - chunk datagrams ([`encode_chunk`], [`decode_chunk`]) carry one
//!   [`Chunk`](crate::fragment::Chunk) each;
//! - acknowledgements ([`encode_ack`], [`decode_ack`]) echo a finalized
//!   frame id back to the producer;
//! - feedback reports ([`FeedbackReport`]) summarise a single-packet stream;
//! - stream packets ([`StreamPacket`]) carry one whole frame each.
//!
//! Decoders never panic on hostile input; every failure surfaces as a
//! [`WireError`].

pub mod ack;
pub mod chunk;
pub mod error;
pub mod packet;
pub mod report;

pub use ack::{ACK_MARKER, decode_ack, encode_ack};
pub use chunk::{CHUNK_MARKER, chunk_overhead, decode_chunk, encode_chunk};
pub use error::WireError;
pub use packet::{STREAM_HEADER_LEN, StreamPacket, decode_stream_packet};
pub use report::{FeedbackReport, REPORT_LEN, REPORT_MAGIC};

fn strip_marker<'a>(
    datagram: &'a [u8],
    marker: &[u8; 4],
    name: &'static str,
) -> Result<&'a [u8], WireError> {
    match datagram.strip_prefix(marker.as_slice()) {
        Some(body) => Ok(body),
        None if datagram.len() < marker.len() => Err(WireError::Truncated {
            needed: marker.len(),
            found: datagram.len(),
        }),
        None => Err(WireError::BadMarker { expected: name }),
    }
}

#[cfg(test)]
mod tests;
