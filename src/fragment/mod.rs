//! Chunk primitives for splitting frames across datagrams.
//!
//! This module collects the producer-side [`Fragmenter`] and the
//! consumer-side [`Reassembler`] together with the metadata they share.
//! Both halves are transport-agnostic; the wire encoding lives in
//! [`crate::wire`].

pub mod config;
pub mod error;
pub mod fragmenter;
pub mod header;
pub mod index;
pub mod reassembler;

pub use config::{DEFAULT_MAX_ROWS_PER_CHUNK, FragmentationConfig};
pub use error::{ChunkStatus, FragmentationError};
pub use fragmenter::{Chunk, ChunkBatch, Fragmenter};
pub use header::{ChunkHeader, ChunkLayout, OPAQUE_TAG};
pub use index::ChunkIndex;
pub use reassembler::{
    AssembledFrame,
    DEFAULT_MAX_FRAME_LAG,
    FinalizeReason,
    Integrity,
    PushOutcome,
    Reassembler,
};
