//! Criterion benchmarks for rankstep-rf: Random Forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rankstep_rf::RandomForestConfig;

fn make_classification(n_samples: usize, n_features: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let labels: Vec<usize> = (0..n_samples).map(|i| i % 2).collect();
    let features = labels
        .iter()
        .map(|&class| {
            (0..n_features)
                .map(|f| {
                    let base = if f < 5 { class as f64 } else { 0.0 };
                    base + rng.r#gen::<f64>()
                })
                .collect()
        })
        .collect();
    (features, labels)
}

fn bench_rf_train(c: &mut Criterion) {
    let (features, labels) = make_classification(200, 500, 42);
    let cfg = RandomForestConfig::new(100).unwrap().with_seed(42);

    c.bench_function("rf_train_200x500_100trees", |b| {
        b.iter(|| cfg.fit(&features, &labels).unwrap());
    });
}

fn bench_rf_predict_batch(c: &mut Criterion) {
    let (features, labels) = make_classification(200, 500, 42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap();

    c.bench_function("rf_predict_batch_200x500_100trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

fn bench_rf_ranking(c: &mut Criterion) {
    let (features, labels) = make_classification(200, 500, 42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap();

    c.bench_function("rf_feature_ranking_500", |b| {
        b.iter(|| forest.feature_ranking());
    });
}

criterion_group!(benches, bench_rf_train, bench_rf_predict_batch, bench_rf_ranking);
criterion_main!(benches);
