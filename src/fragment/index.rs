//! Position of a chunk within its frame.

use derive_more::Display;

/// Zero-based chunk ordinal. The reassembler orders received bytes by it.
///
/// ```
/// use framecast::fragment::ChunkIndex;
///
/// let last = ChunkIndex::new(u32::MAX);
/// assert!(last.checked_increment().is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct ChunkIndex(u32);

impl ChunkIndex {
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Index of the first chunk of every frame.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Index of the following chunk, or `None` past `u32::MAX`.
    #[must_use]
    pub fn checked_increment(self) -> Option<Self> { self.0.checked_add(1).map(Self) }
}
