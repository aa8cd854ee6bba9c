#![doc(html_root_url = "https://docs.rs/framecast/latest")]
//! Public API for the `framecast` library.
//!
//! This crate streams sensor frames over unreliable datagrams. Large frames
//! are split into row-aligned chunks, reassembled on the consumer side with a
//! bounded lag, and acknowledged so the producer can measure per-frame round
//! trip times. A lighter single-packet stream path carries aggregate loss and
//! RTT feedback instead.

pub mod byte_order;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feedback;
pub mod fragment;
pub mod frame;
pub mod metrics;
pub mod producer;
pub mod runtime;
pub mod sequence;
pub mod stats;
pub mod stream;
pub mod synthetic;
pub mod transport;
pub mod wire;

/// Result type alias used throughout the runtime surfaces.
pub use error::{FramecastError, Result};
pub use fragment::{
    AssembledFrame,
    ChunkHeader,
    FragmentationConfig,
    Fragmenter,
    Reassembler,
};
pub use frame::{Frame, FrameId, Payload, PointBlock};
pub use sequence::{SequenceStatus, SequenceTracker};
pub use transport::{MemoryTransport, Transport, UdpTransport};
