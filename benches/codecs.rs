//! Posting codec benchmarks.
//!
//! Run with: `cargo bench --bench codecs`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spindex::codec::{gamma, vbyte};

/// Gaps shaped like real posting lists: mostly small, a few large jumps
fn sample_gaps(count: usize) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(1);
    (0..count)
        .map(|_| {
            if rng.random_bool(0.9) {
                rng.random_range(1..64)
            } else {
                rng.random_range(64..1_000_000)
            }
        })
        .collect()
}

fn bench_vbyte(c: &mut Criterion) {
    let mut group = c.benchmark_group("vbyte");
    for count in [1_000, 100_000] {
        let gaps = sample_gaps(count);
        let encoded = vbyte::encode_all(&gaps);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("encode", count), &gaps, |b, gaps| {
            b.iter(|| vbyte::encode_all(black_box(gaps)))
        });
        group.bench_with_input(BenchmarkId::new("decode", count), &encoded, |b, encoded| {
            b.iter(|| vbyte::decode_all(black_box(encoded)).unwrap())
        });
    }
    group.finish();
}

fn bench_gamma(c: &mut Criterion) {
    let mut group = c.benchmark_group("gamma");
    for count in [1_000, 100_000] {
        let gaps = sample_gaps(count);
        let stream = gamma::encode_all(&gaps).unwrap();
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("encode", count), &gaps, |b, gaps| {
            b.iter(|| gamma::encode_all(black_box(gaps)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decode", count), &stream, |b, stream| {
            b.iter(|| gamma::decode(black_box(&stream.bytes), count).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_vbyte, bench_gamma);
criterion_main!(benches);
