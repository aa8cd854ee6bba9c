//! Configuration used by frame fragmentation.

use std::num::NonZeroUsize;

use crate::wire::chunk_overhead;

/// Default number of point rows carried by one chunk.
pub const DEFAULT_MAX_ROWS_PER_CHUNK: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(rows) => rows,
    None => unreachable!(),
};

/// Settings that bound chunk sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    /// Maximum number of point rows carried by a single chunk.
    pub max_rows_per_chunk: NonZeroUsize,
    /// Emit a single empty terminal chunk for point blocks with zero rows
    /// instead of failing.
    pub allow_empty_frames: bool,
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self {
            max_rows_per_chunk: DEFAULT_MAX_ROWS_PER_CHUNK,
            allow_empty_frames: false,
        }
    }
}

impl FragmentationConfig {
    /// Derive a configuration from the largest datagram the transport will
    /// carry.
    ///
    /// The returned row cap keeps every encoded chunk of `row_size`-byte rows
    /// within `datagram_budget`. Returns `None` when the budget cannot fit the
    /// chunk overhead plus one row.
    #[must_use]
    pub fn for_datagram_budget(datagram_budget: usize, row_size: NonZeroUsize) -> Option<Self> {
        let available = datagram_budget.checked_sub(chunk_overhead().get())?;
        Some(Self {
            max_rows_per_chunk: NonZeroUsize::new(available / row_size.get())?,
            allow_empty_frames: false,
        })
    }

    /// Upper bound on the encoded size of a chunk of `row_size`-byte rows.
    #[must_use]
    pub fn encoded_chunk_ceiling(&self, row_size: NonZeroUsize) -> usize {
        self.max_rows_per_chunk.get() * row_size.get() + chunk_overhead().get()
    }
}
