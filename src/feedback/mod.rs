//! Feedback from consumer to producer.
//!
//! Two feedback paths exist. Chunked frames are acknowledged one by one and
//! matched against [`PendingAcks`] to measure round trips. Single-packet
//! streams send an aggregate [`FeedbackReport`](crate::wire::FeedbackReport)
//! per packet, tracked by [`ReportTracker`]. Both are fire-and-forget: a lost
//! feedback datagram costs one sample and never stalls the sender.

pub mod listener;
pub mod pending;
pub mod report;
pub mod rtt;

pub use listener::{
    AckHandler,
    AckSummary,
    FeedbackHandler,
    ListenerOptions,
    ListenerTask,
    ReportHandler,
    run_listener,
};
pub use pending::{PendingAcks, RttSample};
pub use report::{ReportSample, ReportTracker, unix_timestamp};
pub use rtt::{RttStats, SRTT_ALPHA};
