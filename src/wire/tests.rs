//! Tests for datagram encodings.

use bincode::{config, encode_to_vec};
use bytes::Bytes;
use rstest::rstest;

use super::*;
use crate::{
    fragment::{Chunk, ChunkHeader, ChunkIndex, ChunkLayout},
    frame::{ElementType, FrameId, RowWidth},
};

/// Hand-build a chunk datagram from raw field values.
fn raw_chunk(tag: &str, row_width: u8, index: u32, total: u32) -> Vec<u8> {
    let fields = (7_u64, index, total, tag, row_width, false, &[1_u8, 2, 3][..]);
    let mut buf = CHUNK_MARKER.to_vec();
    buf.extend(encode_to_vec(fields, config::standard()).expect("encode fields"));
    buf
}

fn points_chunk() -> Chunk {
    let header = ChunkHeader::new(
        FrameId::new(42),
        ChunkIndex::new(2),
        3,
        ChunkLayout::Points {
            element: ElementType::F32,
            row_width: RowWidth::Xyz,
        },
        true,
    );
    Chunk::new(header, Bytes::from(vec![9_u8; 24]))
}

#[test]
fn chunk_datagram_round_trips() {
    let chunk = points_chunk();
    let datagram = encode_chunk(&chunk).expect("encode chunk");

    assert!(datagram.starts_with(CHUNK_MARKER));
    assert_eq!(decode_chunk(&datagram).expect("decode chunk"), chunk);
}

#[test]
fn opaque_chunk_uses_raw_tag() {
    let header = ChunkHeader::new(FrameId::new(1), ChunkIndex::zero(), 1, ChunkLayout::Opaque, true);
    let chunk = Chunk::new(header, Bytes::from_static(b"{\"a\":1}"));
    let datagram = encode_chunk(&chunk).expect("encode chunk");

    assert_eq!(datagram, raw_opaque_datagram());
    assert_eq!(decode_chunk(&datagram).expect("decode chunk"), chunk);
}

fn raw_opaque_datagram() -> Vec<u8> {
    let fields = (1_u64, 0_u32, 1_u32, "raw", 0_u8, true, &b"{\"a\":1}"[..]);
    let mut buf = CHUNK_MARKER.to_vec();
    buf.extend(encode_to_vec(fields, config::standard()).expect("encode fields"));
    buf
}

#[test]
fn chunk_accepts_long_form_element_names() {
    let chunk = decode_chunk(&raw_chunk("float32", 3, 0, 1)).expect("alias accepted");
    assert_eq!(
        chunk.header().layout(),
        ChunkLayout::Points {
            element: ElementType::F32,
            row_width: RowWidth::Xyz,
        }
    );
}

#[rstest]
#[case::index_past_total(raw_chunk("f32", 3, 3, 3), "field")]
#[case::zero_total(raw_chunk("f32", 3, 0, 0), "field")]
#[case::unknown_tag(raw_chunk("c64", 3, 0, 1), "field")]
#[case::bad_width(raw_chunk("f32", 5, 0, 1), "field")]
#[case::opaque_with_width(raw_chunk("raw", 3, 0, 1), "field")]
#[case::wrong_marker(b"FACK\x01".to_vec(), "marker")]
#[case::too_short(b"FC".to_vec(), "truncated")]
#[case::empty(Vec::new(), "truncated")]
fn malformed_chunks_are_rejected(#[case] datagram: Vec<u8>, #[case] kind: &str) {
    let err = decode_chunk(&datagram).expect_err("datagram must be rejected");
    assert_eq!(err.kind(), kind, "unexpected error {err}");
}

#[test]
fn truncated_chunk_payload_is_rejected() {
    let mut datagram = encode_chunk(&points_chunk()).expect("encode chunk");
    datagram.truncate(datagram.len() - 1);
    assert!(matches!(decode_chunk(&datagram), Err(WireError::Decode(_))));
}

#[test]
fn trailing_bytes_after_chunk_are_rejected() {
    let mut datagram = encode_chunk(&points_chunk()).expect("encode chunk");
    datagram.push(0);
    assert!(matches!(
        decode_chunk(&datagram),
        Err(WireError::TrailingBytes(1))
    ));
}

#[test]
fn chunk_overhead_bounds_worst_case_header() {
    let header = ChunkHeader::new(
        FrameId::new(u64::MAX),
        ChunkIndex::new(u32::MAX - 1),
        u32::MAX,
        ChunkLayout::Points {
            element: ElementType::F64,
            row_width: RowWidth::Xyzi,
        },
        true,
    );
    let chunk = Chunk::new(header, Bytes::from(vec![0_u8; 1_000]));
    let datagram = encode_chunk(&chunk).expect("encode chunk");
    assert!(datagram.len() <= chunk_overhead().get() + 1_000);
}

#[test]
fn ack_round_trips() {
    let datagram = encode_ack(FrameId::new(10)).expect("encode ack");
    assert!(datagram.starts_with(ACK_MARKER));
    assert_eq!(decode_ack(&datagram).expect("decode ack"), FrameId::new(10));
}

#[rstest]
#[case::chunk_marker(b"FCHK\x0a".to_vec())]
#[case::trailing(b"FACK\x0a\x00".to_vec())]
#[case::missing_id(b"FACK".to_vec())]
fn malformed_acks_are_rejected(#[case] datagram: Vec<u8>) {
    assert!(decode_ack(&datagram).is_err());
}

#[test]
fn feedback_report_layout_is_fixed() {
    let report = FeedbackReport {
        send_timestamp: 1_700_000_000.25,
        sequence: 9,
        total_received: 8,
        total_lost: 1,
    };
    let bytes = report.encode();

    assert_eq!(bytes.len(), REPORT_LEN);
    assert_eq!(&bytes[..4], b"RTFP");
    assert_eq!(&bytes[12..20], &9_u64.to_be_bytes());
    assert_eq!(&bytes[28..36], &1_u64.to_be_bytes());
    assert_eq!(FeedbackReport::decode(&bytes).expect("decode report"), report);
}

#[test]
fn feedback_report_ignores_trailing_bytes() {
    let report = FeedbackReport {
        send_timestamp: 2.0,
        sequence: 0,
        total_received: 1,
        total_lost: 0,
    };
    let mut bytes = report.encode().to_vec();
    bytes.extend_from_slice(&[0xff; 4]);
    assert_eq!(FeedbackReport::decode(&bytes).expect("decode report"), report);
}

#[test]
fn feedback_report_rejects_bad_magic_and_short_input() {
    let mut bytes = FeedbackReport {
        send_timestamp: 0.0,
        sequence: 0,
        total_received: 0,
        total_lost: 0,
    }
    .encode();
    assert!(matches!(
        FeedbackReport::decode(&bytes[..35]),
        Err(WireError::Truncated {
            needed: 36,
            found: 35
        })
    ));

    bytes[0] = b'X';
    assert!(matches!(
        FeedbackReport::decode(&bytes),
        Err(WireError::BadMagic { .. })
    ));
}

#[test]
fn stream_packet_round_trips() {
    let packet = StreamPacket {
        sequence: 5,
        send_timestamp: 1_700_000_000.5,
        name: "000123.json",
        payload: b"{\"objects\":[]}",
    };
    let datagram = packet.encode().expect("encode packet");

    assert_eq!(&datagram[..8], &5_u64.to_le_bytes());
    assert_eq!(&datagram[16..20], &11_u32.to_le_bytes());
    assert_eq!(datagram.len(), STREAM_HEADER_LEN + 11 + 14);
    assert_eq!(decode_stream_packet(&datagram).expect("decode packet"), packet);
}

#[test]
fn stream_packet_with_truncated_name_is_rejected() {
    let packet = StreamPacket {
        sequence: 1,
        send_timestamp: 0.0,
        name: "frame",
        payload: &[],
    };
    let datagram = packet.encode().expect("encode packet");
    assert!(matches!(
        decode_stream_packet(&datagram[..STREAM_HEADER_LEN + 2]),
        Err(WireError::Truncated { .. })
    ));
    assert!(matches!(
        decode_stream_packet(&datagram[..10]),
        Err(WireError::Truncated { .. })
    ));
}

#[test]
fn stream_packet_name_must_be_utf8() {
    let mut datagram = StreamPacket {
        sequence: 1,
        send_timestamp: 0.0,
        name: "ab",
        payload: &[],
    }
    .encode()
    .expect("encode packet");
    datagram[STREAM_HEADER_LEN] = 0xff;
    assert!(matches!(
        decode_stream_packet(&datagram),
        Err(WireError::InvalidName(_))
    ));
}
