//! Benchmarks for TF-IDF fitting and forest training.
//!
//! Run with: cargo bench -p embedprobe-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use embedprobe_core::config::{EvaluationConfig, TfidfConfig};
use embedprobe_core::embedding::{TextEmbedder, TfidfEmbedder};
use embedprobe_core::evaluation::{evaluate_clustering, ForestParams, RandomForest};
use embedprobe_core::Labels;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TOPICS: [&str; 4] = ["graph neural", "protein folding", "robot grasping", "speech audio"];

fn titles(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let topic = TOPICS[i % TOPICS.len()];
            format!("Scalable {topic} methods with benchmark {} and dataset {}", i % 17, i % 11)
        })
        .collect()
}

fn features(n: usize, d: usize) -> (Array2<f32>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut x = Array2::<f32>::zeros((n, d));
    let codes: Vec<usize> = (0..n).map(|i| i % 4).collect();
    for (i, &c) in codes.iter().enumerate() {
        for j in 0..d {
            x[[i, j]] = c as f32 * 0.5 + rng.gen_range(-1.0..1.0);
        }
    }
    (x, codes)
}

fn benchmark_tfidf(c: &mut Criterion) {
    let texts = titles(2000);
    let embedder = TfidfEmbedder::new(TfidfConfig::default());

    c.bench_function("tfidf_fit_transform_2000", |b| {
        b.iter(|| {
            let _ = embedder.embed(black_box(&texts));
        })
    });
}

fn benchmark_forest(c: &mut Criterion) {
    let (x, codes) = features(1000, 384);
    let rows: Vec<usize> = (0..x.nrows()).collect();
    let targets: Vec<bool> = codes.iter().map(|&c| c == 0).collect();
    let params = ForestParams {
        n_trees: EvaluationConfig::default().n_trees,
        ..ForestParams::default()
    };

    let mut group = c.benchmark_group("forest");
    group.sample_size(10);
    group.bench_function("fit_100_trees_1000x384", |b| {
        b.iter(|| {
            let mut forest = RandomForest::new(params.clone());
            forest.fit(black_box(x.view()), &rows, &targets);
            forest
        })
    });
    group.finish();
}

fn benchmark_clustering(c: &mut Criterion) {
    let (x, codes) = features(1000, 384);
    let names: Vec<String> = codes.iter().map(|c| format!("area-{c}")).collect();
    let labels = Labels::encode(&names);

    let mut group = c.benchmark_group("clustering");
    group.sample_size(10);
    group.bench_function("scores_1000x384", |b| {
        b.iter(|| {
            let _ = evaluate_clustering(black_box(x.view()), &labels);
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_tfidf, benchmark_forest, benchmark_clustering);
criterion_main!(benches);
