//! Single-packet streaming.
//!
//! Frames small enough for one datagram skip chunking entirely. Each packet
//! carries a sequence number and the sender's wall-clock time; the receiver
//! infers loss from sequence gaps and answers every fresh packet with a
//! [`FeedbackReport`](crate::wire::FeedbackReport) from which the sender
//! derives round-trip time and the receiver-observed loss rate.

mod receiver;
mod sender;

pub use receiver::{StreamDelivery, StreamReceiver};
pub use sender::{StreamSender, StreamSenderRuntime};
