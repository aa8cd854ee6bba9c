//! Tests for frame emission and the paced producer runtime.

use std::{io, sync::Arc};

use async_trait::async_trait;
use rstest::{fixture, rstest};
use tokio::time::Duration;
use tracing_test::traced_test;

use super::*;
use crate::{
    config::ProducerConfig,
    fragment::FragmentationConfig,
    frame::{FrameId, PointBlock, RowWidth},
    transport::{MAX_DATAGRAM_SIZE, MemoryTransport},
    wire::{decode_chunk, encode_ack},
};

fn points(rows: usize) -> Payload {
    let values: Vec<f32> = (0..rows * 3).map(|v| v as f32).collect();
    PointBlock::from_f32_rows(RowWidth::Xyz, &values)
        .expect("aligned rows")
        .into()
}

#[fixture]
fn small_chunks() -> ProducerConfig {
    ProducerConfig {
        max_rows_per_chunk: 2,
        ..ProducerConfig::default()
    }
}

/// Rejects every send.
struct BrokenTransport;

#[async_trait]
impl Transport for BrokenTransport {
    async fn send(&self, _datagram: &[u8]) -> io::Result<()> {
        Err(io::Error::other("network unreachable"))
    }

    async fn recv(&self, _buf: &mut [u8]) -> io::Result<usize> {
        std::future::pending().await
    }
}

/// Acknowledge every frame whose terminal chunk arrives on `data`.
async fn ack_terminal_chunks(data: MemoryTransport, feedback: MemoryTransport) {
    let mut buf = vec![0_u8; MAX_DATAGRAM_SIZE];
    loop {
        let Ok(len) = data.recv(&mut buf).await else {
            return;
        };
        let chunk = decode_chunk(&buf[..len]).expect("valid chunk");
        if chunk.header().is_terminal() {
            let ack = encode_ack(chunk.header().frame_id()).expect("encode ack");
            feedback.send(&ack).await.expect("send ack");
        }
    }
}

#[rstest]
#[tokio::test]
async fn send_frame_emits_decodable_chunks_and_records_send_time(small_chunks: ProducerConfig) {
    let (data, peer) = MemoryTransport::pair();
    let pending = Arc::new(PendingAcks::new());
    let mut producer = Producer::new(
        small_chunks.fragmentation().expect("fragmentation"),
        data,
        Arc::clone(&pending),
    );

    let sent = producer.send_frame(points(5)).await.expect("frame sent");
    assert_eq!(sent.frame_id, FrameId::new(0));
    assert_eq!(sent.chunks, 3);
    assert_eq!(sent.chunks_sent, 3);
    assert!(pending.contains(FrameId::new(0)));

    let mut buf = vec![0_u8; MAX_DATAGRAM_SIZE];
    let mut rows = Vec::new();
    for expected in 0..3_u32 {
        let len = peer.recv(&mut buf).await.expect("chunk");
        let chunk = decode_chunk(&buf[..len]).expect("decode");
        assert_eq!(chunk.header().chunk_index().get(), expected);
        assert_eq!(chunk.header().is_terminal(), expected == 2);
        rows.push(chunk.payload().len() / 12);
    }
    assert_eq!(rows, [2, 2, 1]);
    assert_eq!(producer.summary().chunks_sent, 3);
    assert_eq!(producer.summary().bytes_sent, sent.bytes_sent as u64);
}

#[tokio::test]
async fn empty_point_block_is_rejected_without_consuming_an_id() {
    let (data, _peer) = MemoryTransport::pair();
    let pending = Arc::new(PendingAcks::new());
    let mut producer = Producer::new(FragmentationConfig::default(), data, Arc::clone(&pending));

    let err = producer.send_frame(points(0)).await.expect_err("empty frame");
    assert!(matches!(err, FramecastError::Fragmentation(_)));
    assert!(pending.is_empty());
    assert_eq!(producer.summary().frames_rejected, 1);

    let sent = producer.send_frame(points(1)).await.expect("frame sent");
    assert_eq!(sent.frame_id, FrameId::new(0));
}

#[tokio::test]
#[traced_test]
async fn send_failures_are_counted_and_do_not_abort_the_frame() {
    let pending = Arc::new(PendingAcks::new());
    let mut producer = Producer::new(
        FragmentationConfig {
            max_rows_per_chunk: std::num::NonZeroUsize::MIN,
            allow_empty_frames: false,
        },
        BrokenTransport,
        Arc::clone(&pending),
    );

    let sent = producer.send_frame(points(3)).await.expect("frame handled");
    assert_eq!(sent.chunks, 3);
    assert_eq!(sent.chunks_sent, 0);
    assert_eq!(producer.summary().send_errors, 3);
    assert_eq!(producer.summary().frames_sent, 1);
    assert!(logs_contain("failed to send chunk"));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn runtime_paces_frames_and_collects_acks(small_chunks: ProducerConfig) {
    let (data, consumer_data) = MemoryTransport::pair();
    let (feedback, consumer_feedback) = MemoryTransport::pair();
    tokio::spawn(ack_terminal_chunks(consumer_data, consumer_feedback));

    let mut runtime = ProducerRuntime::start(&small_chunks, data, feedback).expect("start");
    let started = tokio::time::Instant::now();
    let sent = runtime.run((0..5).map(|_| points(3))).await;
    assert_eq!(sent, 5);
    // The first frame goes out immediately, the rest one period apart.
    assert!(started.elapsed() >= Duration::from_millis(400));

    assert!(runtime.settle(Duration::from_secs(1)).await);
    let summary = runtime.shutdown().await;
    assert_eq!(summary.frames_sent, 5);
    assert_eq!(summary.chunks_sent, 10);
    assert_eq!(summary.acknowledged, 5);
    assert_eq!(summary.unacknowledged, 0);
    assert_eq!(summary.rtt.samples(), 5);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unacknowledged_frames_expire_after_the_ack_timeout(small_chunks: ProducerConfig) {
    let (data, _consumer_data) = MemoryTransport::pair();
    let (feedback, _consumer_feedback) = MemoryTransport::pair();
    let config = ProducerConfig {
        ack_timeout_ms: 1_000,
        ..small_chunks
    };

    let mut runtime = ProducerRuntime::start(&config, data, feedback).expect("start");
    runtime.run((0..3).map(|_| points(1))).await;
    // Nothing acknowledges, so settling only ends once the sweep has
    // written every record off.
    runtime.settle(Duration::from_secs(3)).await;
    assert!(runtime.producer().pending().is_empty());

    let summary = runtime.shutdown().await;
    assert_eq!(summary.acknowledged, 0);
    assert_eq!(summary.unacknowledged, 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn shutdown_token_stops_an_endless_source(small_chunks: ProducerConfig) {
    let (data, _consumer_data) = MemoryTransport::pair();
    let (feedback, _consumer_feedback) = MemoryTransport::pair();
    let mut runtime = ProducerRuntime::start(&small_chunks, data, feedback).expect("start");

    let token = runtime.shutdown_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        token.cancel();
    });
    let sent = runtime.run(std::iter::repeat_with(|| points(1))).await;
    assert_eq!(sent, 3);

    let summary = runtime.shutdown().await;
    assert_eq!(summary.frames_sent, 3);
    assert_eq!(summary.unacknowledged, 3);
}

#[test]
fn invalid_config_is_rejected_before_spawning() {
    let config = ProducerConfig {
        send_rate_hz: -1.0,
        ..ProducerConfig::default()
    };
    let (data, _) = MemoryTransport::pair();
    let (feedback, _) = MemoryTransport::pair();
    assert!(ProducerRuntime::start(&config, data, feedback).is_err());
}
