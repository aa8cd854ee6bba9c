//! Tests for datagram transports.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::time::{Duration, timeout};

use super::*;

#[tokio::test]
async fn memory_pair_delivers_both_ways() {
    let (left, right) = MemoryTransport::pair();
    let mut buf = [0_u8; 16];

    left.send(b"ping").await.expect("send ping");
    let len = right.recv(&mut buf).await.expect("recv ping");
    assert_eq!(&buf[..len], b"ping");

    right.send(b"pong").await.expect("send pong");
    let len = left.recv(&mut buf).await.expect("recv pong");
    assert_eq!(&buf[..len], b"pong");
}

#[tokio::test]
async fn drop_filter_discards_matching_datagrams() {
    let (left, right) = MemoryTransport::pair();
    let left = left.with_drop_filter(|datagram| datagram.starts_with(b"x"));
    let mut buf = [0_u8; 16];

    left.send(b"xray").await.expect("send dropped");
    left.send(b"yank").await.expect("send kept");

    let len = right.recv(&mut buf).await.expect("recv");
    assert_eq!(&buf[..len], b"yank");
}

#[tokio::test]
async fn oversized_datagrams_are_truncated() {
    let (left, right) = MemoryTransport::pair();
    let mut buf = [0_u8; 3];

    left.send(b"abcdef").await.expect("send");
    assert_eq!(right.recv(&mut buf).await.expect("recv"), 3);
    assert_eq!(&buf, b"abc");
}

#[tokio::test(start_paused = true)]
async fn recv_waits_once_the_peer_is_gone() {
    let (left, right) = MemoryTransport::pair();
    drop(left);
    let mut buf = [0_u8; 4];
    assert!(
        timeout(Duration::from_secs(5), right.recv(&mut buf))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn shared_transport_forwards_through_arc() {
    let (left, right) = MemoryTransport::pair();
    let left = Arc::new(left);
    let mut buf = [0_u8; 8];

    Transport::send(&left, b"arc").await.expect("send");
    let len = right.recv(&mut buf).await.expect("recv");
    assert_eq!(&buf[..len], b"arc");
}

#[tokio::test]
async fn udp_loopback_round_trip() {
    let receiver = UdpTransport::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .expect("bind receiver");
    let addr = receiver.local_addr().expect("local addr");
    let sender = UdpTransport::connect(addr).await.expect("connect sender");
    assert_eq!(sender.peer(), Some(addr));

    sender.send(b"datagram").await.expect("send");
    let mut buf = [0_u8; 64];
    let len = timeout(Duration::from_secs(5), receiver.recv(&mut buf))
        .await
        .expect("datagram arrives")
        .expect("recv");
    assert_eq!(&buf[..len], b"datagram");
}

#[tokio::test]
async fn unconnected_udp_cannot_send() {
    let socket = UdpTransport::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .expect("bind");
    let err = socket.send(b"nowhere").await.expect_err("no peer");
    assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);
}
