use bincode::{Decode, Encode};
use derive_more::{Display, From, Into};

/// Identifier assigned to a sensor frame by the producing side.
///
/// Identifiers are strictly increasing for the lifetime of a
/// [`Fragmenter`](crate::fragment::Fragmenter), so ordering comparisons are
/// meaningful: a larger id always denotes a newer frame.
///
/// # Examples
///
/// ```
/// use framecast::frame::FrameId;
/// let id = FrameId::new(7);
/// assert_eq!(id.get(), 7);
/// assert!(FrameId::new(8) > id);
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Display, From, Into,
)]
#[display("{_0}")]
pub struct FrameId(u64);

impl FrameId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }

    /// Return the following identifier, or `None` once the counter is exhausted.
    #[must_use]
    pub fn checked_next(self) -> Option<Self> { self.0.checked_add(1).map(Self) }
}
