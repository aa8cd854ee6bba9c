//! Errors raised while decoding datagrams.

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

use crate::frame::InvalidRowWidth;

/// A datagram could not be decoded into a protocol message.
///
/// Receive loops log and count these, then drop the datagram; they never
/// abort a loop.
#[derive(Debug, Error)]
pub enum WireError {
    /// The datagram does not start with the expected marker.
    #[error("datagram does not start with the {expected} marker")]
    BadMarker { expected: &'static str },
    /// A feedback report carried an unexpected magic number.
    #[error("unexpected feedback magic {found:#010x}")]
    BadMagic { found: u32 },
    /// The datagram ended before a fixed-size field.
    #[error("datagram truncated: need {needed} bytes, found {found}")]
    Truncated { needed: usize, found: usize },
    /// The record following the marker is malformed.
    #[error("failed to decode record: {0}")]
    Decode(#[from] DecodeError),
    /// The record decoded but left bytes behind.
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
    /// A decoded field violates a protocol invariant.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
    /// The element type tag is not recognised.
    #[error("unknown element type {0:?}")]
    UnknownElementType(String),
    #[error(transparent)]
    RowWidth(#[from] InvalidRowWidth),
    /// A stream packet name is not UTF-8.
    #[error("stream name is not valid UTF-8: {0}")]
    InvalidName(#[from] std::str::Utf8Error),
    /// Encoding an outbound message failed.
    #[error("failed to encode record: {0}")]
    Encode(#[from] EncodeError),
}

impl WireError {
    /// Short, stable label used for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BadMarker { .. } | Self::BadMagic { .. } => "marker",
            Self::Truncated { .. } => "truncated",
            Self::Decode(_) | Self::TrailingBytes(_) | Self::Encode(_) => "record",
            Self::InvalidField(_) | Self::UnknownElementType(_) | Self::RowWidth(_) => "field",
            Self::InvalidName(_) => "name",
        }
    }
}
