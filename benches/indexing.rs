//! End-to-end indexing benchmarks over a generated corpus.
//!
//! Run with: `cargo bench --bench indexing`
//! Save baseline: `cargo bench -- --save-baseline main`
//! Compare: `cargo bench -- --baseline main`

use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spindex::index::build::build_index;
use spindex::index::IndexConfig;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const DOCUMENTS: usize = 2_000;
const WORDS: usize = 5_000;

/// Directory corpus with Zipf-ish word frequencies
fn generate_corpus(dir: &Path) {
    let mut rng = StdRng::seed_from_u64(3);
    for doc in 0..DOCUMENTS {
        let len = rng.random_range(50..400);
        let text: Vec<String> = (0..len)
            .map(|_| {
                let rank = (rng.random::<f64>().powi(3) * WORDS as f64) as usize;
                format!("w{}", rank)
            })
            .collect();
        fs::write(dir.join(format!("doc{:05}.txt", doc)), text.join(" ")).unwrap();
    }
}

fn bench_build(c: &mut Criterion) {
    let corpus = TempDir::new().unwrap();
    generate_corpus(corpus.path());

    let mut group = c.benchmark_group("indexing");
    group.sample_size(10); // Fewer samples since each build is slow
    group.measurement_time(Duration::from_secs(60));

    for run_size in [10_000, 1_000_000] {
        group.bench_function(format!("build_run_size_{}", run_size), |b| {
            b.iter(|| {
                let out = TempDir::new().unwrap();
                let config = IndexConfig {
                    output_dir: out.path().to_path_buf(),
                    run_size,
                    progress: false,
                    ..IndexConfig::default()
                };
                build_index(corpus.path(), &config).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
