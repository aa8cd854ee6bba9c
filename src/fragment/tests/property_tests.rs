//! Generated checks for reassembly under loss, duplication and reordering.

use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
};

use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    prop_assert,
    prop_assert_eq,
    sample::Index,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rstest::rstest;

use super::tagged_block;
use crate::{
    fragment::{AssembledFrame, Chunk, FragmentationConfig, Fragmenter, Integrity, Reassembler},
    frame::{FrameId, Payload, PointBlock},
};

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

/// Rows per frame, rows per chunk, and a delivery schedule that picks chunks
/// by position with repetition, so the schedule drops, duplicates and
/// reorders freely.
fn delivery_strategy() -> impl Strategy<Value = (Vec<usize>, usize, Vec<Index>)> {
    (vec(1usize..24, 1..8), 1usize..6, vec(any::<Index>(), 0..96))
}

fn fragment_all(
    frame_rows: &[usize],
    max_rows: usize,
) -> Result<(HashMap<FrameId, PointBlock>, Vec<Chunk>), TestCaseError> {
    let fragmenter = Fragmenter::new(FragmentationConfig {
        max_rows_per_chunk: NonZeroUsize::new(max_rows)
            .ok_or_else(|| TestCaseError::fail("zero rows per chunk".to_owned()))?,
        allow_empty_frames: false,
    });
    let mut originals = HashMap::new();
    let mut chunks = Vec::new();
    for (frame, rows) in frame_rows.iter().enumerate() {
        let block = tagged_block(frame, *rows);
        let batch = fragmenter
            .fragment_payload(block.clone().into())
            .map_err(|err| TestCaseError::fail(format!("fragment failed: {err}")))?;
        originals.insert(batch.frame_id(), block);
        chunks.extend(batch.into_chunks());
    }
    Ok((originals, chunks))
}

/// Every emitted row must come from the original frame, in original order.
fn check_frame(
    frame: &AssembledFrame,
    originals: &HashMap<FrameId, PointBlock>,
) -> Result<(), TestCaseError> {
    prop_assert!(frame.received_chunks() <= frame.total_chunks());
    prop_assert_eq!(frame.integrity(), Integrity::Intact);
    let Payload::Points(block) = frame.payload() else {
        return Err(TestCaseError::fail("point frame came back opaque".to_owned()));
    };
    let original = originals
        .get(&frame.frame_id())
        .ok_or_else(|| TestCaseError::fail("unknown frame id".to_owned()))?;
    if frame.is_complete() {
        prop_assert_eq!(block, original);
    }

    let values = block
        .f32_values()
        .ok_or_else(|| TestCaseError::fail("expected f32 rows".to_owned()))?;
    let mut previous_row = -1.0_f32;
    for row in values.chunks_exact(4) {
        prop_assert_eq!(row[0], frame.frame_id().get() as f32);
        prop_assert!(row[1] > previous_row);
        previous_row = row[1];
    }
    Ok(())
}

#[rstest]
#[case(3, 128)]
#[case(5, 256)]
fn arbitrary_delivery_preserves_reassembly_invariants(#[case] lag: usize, #[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let lag = NonZeroUsize::new(lag).expect("non-zero");

    runner
        .run(&delivery_strategy(), |(frame_rows, max_rows, schedule)| {
            let (originals, chunks) = fragment_all(&frame_rows, max_rows)?;
            let mut reassembler = Reassembler::new(lag);
            let mut emitted = HashSet::new();
            let mut last_processed = None;

            for pick in &schedule {
                let outcome = reassembler.push(pick.get(&chunks).clone());

                prop_assert!(reassembler.buffered_len() <= lag.get());
                prop_assert!(reassembler.last_processed() >= last_processed);
                last_processed = reassembler.last_processed();

                for frame in &outcome.finalized {
                    prop_assert!(emitted.insert(frame.frame_id()), "frame emitted twice");
                    prop_assert!(Some(frame.frame_id()) <= last_processed);
                    check_frame(frame, &originals)?;
                }
            }

            for frame in reassembler.flush() {
                prop_assert!(emitted.insert(frame.frame_id()), "frame emitted twice");
                check_frame(&frame, &originals)?;
            }
            Ok(())
        })
        .expect("reassembly invariants should hold for any delivery schedule");
}

#[rstest]
#[case(64)]
fn in_order_delivery_reproduces_every_frame(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);

    runner
        .run(&delivery_strategy(), |(frame_rows, max_rows, _)| {
            let (originals, chunks) = fragment_all(&frame_rows, max_rows)?;
            let mut reassembler = Reassembler::default();
            let mut emitted = Vec::new();

            for chunk in chunks {
                emitted.extend(reassembler.push(chunk).finalized);
            }

            prop_assert_eq!(emitted.len(), originals.len());
            for frame in &emitted {
                prop_assert!(frame.is_complete());
                check_frame(frame, &originals)?;
            }
            Ok(())
        })
        .expect("lossless delivery should reproduce every frame");
}
