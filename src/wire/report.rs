//! Aggregate feedback reports sent by stream receivers.
//!
//! A report is a fixed 36-byte datagram in network byte order:
//!
//! | field                     | type |
//! |---------------------------|------|
//! | magic (`"RTFP"`)          | u32  |
//! | original send timestamp   | f64  |
//! | sequence                  | u64  |
//! | total received            | u64  |
//! | total lost                | u64  |

use crate::byte_order::{
    read_network_f64,
    read_network_u32,
    read_network_u64,
    write_network_f64,
    write_network_u32,
    write_network_u64,
};

use super::WireError;

/// Magic number identifying a feedback report.
pub const REPORT_MAGIC: u32 = 0x5254_4650;

/// Encoded size of a feedback report.
pub const REPORT_LEN: usize = 36;

/// Receiver-side view of the stream echoed back to the sender.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedbackReport {
    /// Send timestamp copied from the packet being acknowledged, in seconds
    /// since the UNIX epoch.
    pub send_timestamp: f64,
    pub sequence: u64,
    pub total_received: u64,
    pub total_lost: u64,
}

impl FeedbackReport {
    /// Encode the report.
    #[must_use]
    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let mut buf = [0_u8; REPORT_LEN];
        buf[0..4].copy_from_slice(&write_network_u32(REPORT_MAGIC));
        buf[4..12].copy_from_slice(&write_network_f64(self.send_timestamp));
        buf[12..20].copy_from_slice(&write_network_u64(self.sequence));
        buf[20..28].copy_from_slice(&write_network_u64(self.total_received));
        buf[28..36].copy_from_slice(&write_network_u64(self.total_lost));
        buf
    }

    /// Decode a report. Bytes beyond the first [`REPORT_LEN`] are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Truncated`] for short datagrams and
    /// [`WireError::BadMagic`] when the magic number does not match.
    pub fn decode(datagram: &[u8]) -> Result<Self, WireError> {
        let Some(bytes) = datagram.first_chunk::<REPORT_LEN>() else {
            return Err(WireError::Truncated {
                needed: REPORT_LEN,
                found: datagram.len(),
            });
        };
        let magic = read_network_u32(field(bytes, 0));
        if magic != REPORT_MAGIC {
            return Err(WireError::BadMagic { found: magic });
        }
        Ok(Self {
            send_timestamp: read_network_f64(field(bytes, 4)),
            sequence: read_network_u64(field(bytes, 12)),
            total_received: read_network_u64(field(bytes, 20)),
            total_lost: read_network_u64(field(bytes, 28)),
        })
    }
}

fn field<const N: usize>(bytes: &[u8; REPORT_LEN], offset: usize) -> [u8; N] {
    let mut out = [0_u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}
