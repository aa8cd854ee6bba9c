//! Criterion benchmarks for chunk encoding, decoding and reassembly.
//!
//! Workloads are synthetic scans of increasing size split at the default
//! chunk size, so the numbers track the per-frame cost a consumer pays.

use criterion::{BenchmarkId, Criterion, Throughput, black_box};
use framecast::{
    fragment::{FragmentationConfig, Fragmenter, Reassembler},
    frame::{Payload, RowWidth},
    synthetic::SyntheticCloud,
    wire::{decode_chunk, encode_chunk},
};

const SCAN_SIZES: [usize; 3] = [500, 2_000, 20_000];

fn scan(points: usize) -> Payload {
    SyntheticCloud::new(points, RowWidth::Xyzi)
        .next()
        .unwrap_or_else(|| panic!("synthetic source is endless"))
}

fn encoded_frames(points: usize, frames: usize) -> Vec<Vec<Vec<u8>>> {
    let fragmenter = Fragmenter::new(FragmentationConfig::default());
    SyntheticCloud::new(points, RowWidth::Xyzi)
        .take(frames)
        .map(|payload| match fragmenter.fragment_payload(payload) {
            Ok(batch) => batch
                .chunks()
                .iter()
                .map(|chunk| match encode_chunk(chunk) {
                    Ok(datagram) => datagram,
                    Err(err) => panic!("encode failed: {err}"),
                })
                .collect(),
            Err(err) => panic!("fragmentation failed: {err}"),
        })
        .collect()
}

fn benchmark_fragment(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk/fragment_encode");
    let fragmenter = Fragmenter::new(FragmentationConfig::default());

    for points in SCAN_SIZES {
        let payload = scan(points);
        group.throughput(Throughput::Bytes(payload.byte_len() as u64));
        group.bench_function(BenchmarkId::from_parameter(points), |b| {
            b.iter(|| {
                let batch = match fragmenter.fragment_payload(payload.clone()) {
                    Ok(batch) => batch,
                    Err(err) => panic!("fragmentation failed: {err}"),
                };
                for chunk in batch.chunks() {
                    black_box(encode_chunk(chunk).map(|d| d.len()).unwrap_or_default());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_reassemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk/decode_reassemble");

    for points in SCAN_SIZES {
        let frames = encoded_frames(points, 8);
        let bytes: usize = frames.iter().flatten().map(Vec::len).sum();
        group.throughput(Throughput::Bytes(bytes as u64));
        group.bench_function(BenchmarkId::from_parameter(points), |b| {
            b.iter(|| {
                let mut reassembler = Reassembler::default();
                let mut delivered = 0_usize;
                for datagram in frames.iter().flatten() {
                    let chunk = match decode_chunk(datagram) {
                        Ok(chunk) => chunk,
                        Err(err) => panic!("decode failed: {err}"),
                    };
                    delivered += reassembler.push(chunk).finalized.len();
                }
                black_box(delivered)
            });
        });
    }

    group.finish();
}

/// Entrypoint for chunk pipeline benchmarks.
fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    benchmark_fragment(&mut criterion);
    benchmark_reassemble(&mut criterion);
    criterion.final_summary();
}
