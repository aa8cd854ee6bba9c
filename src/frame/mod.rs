//! Sensor frame model.
//!
//! A [`Frame`] pairs a monotonically increasing [`FrameId`] with a
//! [`Payload`], which is either an opaque byte blob or a [`PointBlock`] of
//! fixed-width rows (three or four columns of one numeric element type).

pub mod element;
pub mod id;
pub mod payload;

pub use element::{ElementType, InvalidRowWidth, RowWidth};
pub use id::FrameId;
pub use payload::{Frame, MisalignedRows, Payload, PointBlock};

#[cfg(test)]
mod tests;
