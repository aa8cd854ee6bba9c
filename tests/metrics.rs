#![cfg(feature = "metrics")]
//! Tests for `framecast` metrics helpers.
//!
//! These tests verify that counters and histograms update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.
use std::time::Duration;

use framecast::metrics::{self as fc_metrics, Direction, RttSource};
use metrics::{SharedString, Unit};
use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};
use rstest::rstest;

/// One snapshot's entries. Taking a snapshot drains counters, so each test
/// takes exactly one and queries it repeatedly.
type Entries = [(CompositeKey, Option<Unit>, Option<SharedString>, DebugValue)];

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter_value(entries: &Entries, name: &str, label: Option<(&str, &str)>) -> u64 {
    entries
        .iter()
        .filter(|(k, _, _, _)| {
            k.key().name() == name
                && label.is_none_or(|(key, value)| {
                    k.key()
                        .labels()
                        .any(|l| l.key() == key && l.value() == value)
                })
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

#[rstest]
#[case(Direction::Outbound, "outbound")]
#[case(Direction::Inbound, "inbound")]
fn chunk_metric_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || fc_metrics::inc_chunks(direction));

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_value(&entries, fc_metrics::CHUNKS_TOTAL, Some(("direction", label))),
        1
    );
}

#[test]
fn malformed_datagrams_are_labelled_by_kind() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        fc_metrics::inc_malformed("truncated");
        fc_metrics::inc_malformed("truncated");
        fc_metrics::inc_malformed("bad_magic");
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_value(
            &entries,
            fc_metrics::DATAGRAMS_MALFORMED,
            Some(("kind", "truncated"))
        ),
        2
    );
    assert_eq!(
        counter_value(&entries, fc_metrics::DATAGRAMS_MALFORMED, None),
        3
    );
}

#[rstest]
#[case(1)]
#[case(7)]
fn loss_counters_add_the_given_amount(#[case] count: u64) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        fc_metrics::add_packets_lost(count);
        fc_metrics::add_unacknowledged(count);
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_value(&entries, fc_metrics::PACKETS_LOST, None),
        count
    );
    assert_eq!(
        counter_value(&entries, fc_metrics::FRAMES_UNACKNOWLEDGED, None),
        count
    );
}

#[test]
fn rtt_samples_are_recorded_in_seconds() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        fc_metrics::observe_rtt(RttSource::Report, Duration::from_millis(250));
    });

    let metrics = snapshotter.snapshot().into_vec();
    let found = metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == fc_metrics::RTT_SECONDS
            && k.key()
                .labels()
                .any(|l| l.key() == "source" && l.value() == "report")
            && matches!(v, DebugValue::Histogram(samples)
                if samples.iter().any(|s| (s.0 - 0.25).abs() < 1e-9))
    });
    assert!(found, "rtt histogram not recorded");
}
