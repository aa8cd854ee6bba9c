//! Unit tests for the frame model.

use bytes::Bytes;
use rstest::rstest;

use super::*;

#[rstest]
#[case(ElementType::U8, 1)]
#[case(ElementType::I16, 2)]
#[case(ElementType::F32, 4)]
#[case(ElementType::F64, 8)]
fn element_sizes(#[case] element: ElementType, #[case] size: usize) {
    assert_eq!(element.size(), size);
}

#[rstest]
#[case("f32", ElementType::F32)]
#[case("float32", ElementType::F32)]
#[case("uint8", ElementType::U8)]
#[case("i32", ElementType::I32)]
fn element_tags_parse_with_aliases(#[case] tag: &str, #[case] expected: ElementType) {
    assert_eq!(ElementType::from_tag(tag), Some(expected));
    assert_eq!(ElementType::from_tag(expected.tag()), Some(expected));
}

#[test]
fn unknown_element_tag_is_rejected() {
    assert_eq!(ElementType::from_tag("complex64"), None);
}

#[rstest]
#[case(3, Ok(RowWidth::Xyz))]
#[case(4, Ok(RowWidth::Xyzi))]
#[case(0, Err(InvalidRowWidth(0)))]
#[case(5, Err(InvalidRowWidth(5)))]
fn row_width_conversion(#[case] raw: u8, #[case] expected: Result<RowWidth, InvalidRowWidth>) {
    assert_eq!(RowWidth::try_from(raw), expected);
}

#[test]
fn point_block_rejects_partial_rows() {
    let err = PointBlock::new(ElementType::F32, RowWidth::Xyz, vec![0_u8; 13])
        .expect_err("13 bytes cannot hold 12-byte rows");
    assert_eq!(
        err,
        MisalignedRows {
            len: 13,
            row_size: 12
        }
    );
}

#[test]
fn point_block_exposes_rows() {
    let values = [1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    let block = PointBlock::from_f32_rows(RowWidth::Xyzi, &values).expect("two whole rows");

    assert_eq!(block.row_count(), 2);
    assert_eq!(block.row_size(), 16);
    assert_eq!(block.rows().count(), 2);
    assert_eq!(block.f32_values().expect("f32 block"), values.to_vec());
    assert_eq!(block.slice_rows(1..2).len(), 16);
}

#[test]
fn f32_values_is_none_for_other_types() {
    let block = PointBlock::new(ElementType::U8, RowWidth::Xyz, vec![1_u8, 2, 3]).expect("one row");
    assert!(block.f32_values().is_none());
}

#[test]
fn payload_length_covers_both_variants() {
    let opaque = Payload::from(Bytes::from_static(b"abc"));
    let points = Payload::from(PointBlock::empty(ElementType::F64, RowWidth::Xyz));

    assert_eq!(opaque.byte_len(), 3);
    assert!(points.is_empty());
    assert!(opaque.as_points().is_none());
}

#[test]
fn frame_ids_order_numerically() {
    assert!(FrameId::new(2) < FrameId::new(10));
    assert_eq!(FrameId::new(u64::MAX).checked_next(), None);
    assert_eq!(FrameId::new(4).to_string(), "4");
}
