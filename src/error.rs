//! Canonical error and result types for the crate.
//!
//! `FramecastError` is returned from startup and teardown paths. The steady
//! state loops never surface per-datagram failures through it; those are
//! logged, counted, and skipped.

use std::io;

use thiserror::Error;

use crate::{config::ConfigError, fragment::FragmentationError, wire::WireError};

/// Top-level error type exposed by `framecast`.
#[derive(Debug, Error)]
pub enum FramecastError {
    /// Binding, connecting, or sending on a transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// Configuration could not be loaded or is out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A frame could not be split into chunks.
    #[error("fragmentation error: {0}")]
    Fragmentation(#[from] FragmentationError),
    /// A datagram could not be encoded.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
    /// The Prometheus exporter could not be installed.
    #[cfg(feature = "metrics")]
    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Canonical result alias used by `framecast` public APIs.
pub type Result<T> = std::result::Result<T, FramecastError>;
