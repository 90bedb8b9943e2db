//! Accuracy regression tests for rankstep-rf.
//!
//! These tests verify that algorithmic changes do not degrade classification
//! accuracy or feature ranking on a deterministic synthetic dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rankstep_rf::{MaxFeatures, RandomForestConfig, SplitCriterion};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic binary dataset
// ---------------------------------------------------------------------------

/// Generate a 200-sample, 12-feature, 2-class dataset.
///
/// Features 0-2 are informative (class * 1.0 + noise in [0, 1)).
/// Features 3-11 are pure noise in [0, 1).
fn make_classification(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(200);
    let mut labels = Vec::with_capacity(200);
    for i in 0..200 {
        let class = i % 2;
        labels.push(class);
        let row: Vec<f64> = (0..12)
            .map(|f| {
                let base = if f < 3 { class as f64 } else { 0.0 };
                base + rng.r#gen::<f64>()
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

fn accuracy(predicted: &[usize], truth: &[usize]) -> f64 {
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}

/// Held-out accuracy must exceed 0.85 when trained on a disjoint draw.
#[test]
fn held_out_accuracy_above_threshold() {
    let (train_x, train_y) = make_classification(42);
    let (test_x, test_y) = make_classification(7);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&train_x, &train_y)
        .unwrap();

    let acc = accuracy(&forest.predict_batch(&test_x).unwrap(), &test_y);
    assert!(acc > 0.85, "held-out accuracy {acc} <= 0.85");
}

/// The three informative features must occupy the top three ranks.
#[test]
fn top_features_are_informative() {
    let (features, labels) = make_classification(42);
    for criterion in [SplitCriterion::Gini, SplitCriterion::Entropy] {
        let forest = RandomForestConfig::new(100)
            .unwrap()
            .with_criterion(criterion)
            .with_seed(42)
            .fit(&features, &labels)
            .unwrap();
        let mut top3: Vec<usize> = forest
            .feature_ranking()
            .top(3)
            .iter()
            .map(|f| f.index())
            .collect();
        top3.sort_unstable();
        assert_eq!(top3, vec![0, 1, 2], "criterion {criterion:?}");
    }
}

/// Training accuracy with fully grown trees should be near perfect.
#[test]
fn training_accuracy_near_perfect() {
    let (features, labels) = make_classification(42);
    let forest = RandomForestConfig::new(50)
        .unwrap()
        .with_max_features(MaxFeatures::All)
        .with_seed(1)
        .fit(&features, &labels)
        .unwrap();
    let acc = accuracy(&forest.predict_batch(&features).unwrap(), &labels);
    assert!(acc > 0.95, "training accuracy {acc} <= 0.95");
}

/// Same config and seed must produce identical predictions and importances.
#[test]
fn deterministic_across_runs() {
    let (features, labels) = make_classification(42);
    let config = RandomForestConfig::new(40).unwrap().with_seed(17);
    let a = config.fit(&features, &labels).unwrap();
    let b = config.fit(&features, &labels).unwrap();
    assert_eq!(a.predict_batch(&features).unwrap(), b.predict_batch(&features).unwrap());
    assert_eq!(a.feature_importances(), b.feature_importances());
}
