use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cytodx::config::PipelineConfig;
use cytodx::data::{Dataset, Sample};
use cytodx::inference::DiagnosisEngine;
use cytodx::pipeline::TrainingPipeline;
use cytodx::selection::{ClusterSearchConfig, ForestSearchConfig};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn cytology_rows(rng: &mut ChaCha8Rng, n_rows: usize) -> Vec<(Vec<f64>, i32)> {
    (0..n_rows)
        .map(|i| {
            let malignant = i % 2 == 1;
            let row = (0..9)
                .map(|_| {
                    let v = if malignant { rng.gen_range(5..=10u32) } else { rng.gen_range(1..=4u32) };
                    v as f64
                })
                .collect();
            (row, if malignant { 4 } else { 2 })
        })
        .collect()
}

fn trained_engine() -> DiagnosisEngine {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let samples = cytology_rows(&mut rng, 400)
        .into_iter()
        .map(|(row, label)| Sample::complete(&row, label))
        .collect();
    let dataset = Dataset::with_standard_schema(samples).unwrap();

    let config = PipelineConfig::default()
        .with_cluster_search(ClusterSearchConfig::default().with_n_components(vec![2]).with_n_init(2))
        .with_forest_search(
            ForestSearchConfig::default()
                .with_n_estimators(vec![100])
                .with_max_depth(vec![None])
                .with_min_samples_split(vec![2])
                .with_min_samples_leaf(vec![1]),
        );
    let (artifacts, _) = TrainingPipeline::new(config).run(&dataset).unwrap();
    DiagnosisEngine::new(artifacts).unwrap()
}

fn bench_inference(c: &mut Criterion) {
    let engine = trained_engine();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let sample = cytology_rows(&mut rng, 1).remove(0).0;

    let mut group = c.benchmark_group("inference");
    group.bench_function("diagnose_one", |b| b.iter(|| engine.diagnose_one(black_box(&sample)).unwrap()));
    group.bench_function("recommend", |b| b.iter(|| engine.recommend(black_box(&sample)).unwrap()));

    for n_rows in [100, 1000, 10000].iter() {
        let rows: Vec<Vec<f64>> = cytology_rows(&mut rng, *n_rows).into_iter().map(|(row, _)| row).collect();
        group.bench_with_input(BenchmarkId::new("diagnose_batch", n_rows), &rows, |b, rows| {
            b.iter(|| engine.diagnose_batch(black_box(rows)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_inference);
criterion_main!(benches);
