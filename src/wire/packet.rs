//! Single-packet stream datagrams.
//!
//! Each datagram carries one whole frame behind a little-endian header:
//! `[sequence u64][send_timestamp f64][name_len u32][name][payload]`.

use crate::byte_order::{
    read_le_f64,
    read_le_u32,
    read_le_u64,
    write_le_f64,
    write_le_u32,
    write_le_u64,
};

use super::WireError;

/// Size of the fixed part of the header.
pub const STREAM_HEADER_LEN: usize = 20;

/// A decoded stream packet borrowing from the datagram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamPacket<'a> {
    pub sequence: u64,
    /// Seconds since the UNIX epoch at which the sender stamped the packet.
    pub send_timestamp: f64,
    /// Label of the frame, typically its source file name.
    pub name: &'a str,
    pub payload: &'a [u8],
}

impl StreamPacket<'_> {
    /// Encode the packet into a datagram.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidField`] if the name is longer than
    /// `u32::MAX` bytes.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let name_len = u32::try_from(self.name.len())
            .map_err(|_| WireError::InvalidField("stream name longer than u32::MAX"))?;
        let mut buf =
            Vec::with_capacity(STREAM_HEADER_LEN + self.name.len() + self.payload.len());
        buf.extend_from_slice(&write_le_u64(self.sequence));
        buf.extend_from_slice(&write_le_f64(self.send_timestamp));
        buf.extend_from_slice(&write_le_u32(name_len));
        buf.extend_from_slice(self.name.as_bytes());
        buf.extend_from_slice(self.payload);
        Ok(buf)
    }
}

/// Decode a stream packet.
///
/// # Errors
///
/// Returns [`WireError::Truncated`] when the header or name is cut short and
/// [`WireError::InvalidName`] when the name is not UTF-8.
pub fn decode_stream_packet(datagram: &[u8]) -> Result<StreamPacket<'_>, WireError> {
    let Some((header, rest)) = datagram.split_first_chunk::<STREAM_HEADER_LEN>() else {
        return Err(WireError::Truncated {
            needed: STREAM_HEADER_LEN,
            found: datagram.len(),
        });
    };
    let (sequence, tail) = header.split_at(8);
    let (timestamp, name_len) = tail.split_at(8);
    let sequence = read_le_u64(to_array(sequence));
    let send_timestamp = read_le_f64(to_array(timestamp));
    let name_len = read_le_u32(to_array(name_len)) as usize;

    let Some((name, payload)) = rest.split_at_checked(name_len) else {
        return Err(WireError::Truncated {
            needed: STREAM_HEADER_LEN + name_len,
            found: datagram.len(),
        });
    };
    Ok(StreamPacket {
        sequence,
        send_timestamp,
        name: std::str::from_utf8(name)?,
        payload,
    })
}

fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0_u8; N];
    out.copy_from_slice(bytes);
    out
}
