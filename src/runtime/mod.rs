//! Building blocks shared by the sender and receiver loops.
//!
//! [`ReceiveLoop`] races a transport against cancellation and a
//! housekeeping tick, [`Pacer`] spaces out frame emission, and
//! [`BackoffConfig`] governs retries after failed receives.

pub mod backoff;
pub mod pacing;
pub mod receive;

pub use backoff::BackoffConfig;
pub use pacing::{Pacer, PacerAction, frame_period};
pub use receive::{LoopEvent, ReceiveLoop};
