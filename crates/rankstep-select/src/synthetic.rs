//! Synthetic binary classification data.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::dataset::Dataset;
use crate::error::SelectError;
use crate::label::Label;

/// Generate a balanced two-class dataset.
///
/// Samples alternate `+1`, `-1`. Every value is standard normal noise; the
/// first `n_informative` columns are additionally shifted by `+shift / 2`
/// for `+1` samples and `-shift / 2` for `-1` samples.
///
/// # Errors
///
/// Returns [`SelectError::InvalidGeneratorParams`] when `n_per_class` or
/// `n_features` is zero, `n_informative > n_features`, or `shift` is not
/// finite.
pub fn make_classification(
    n_per_class: usize,
    n_features: usize,
    n_informative: usize,
    shift: f64,
    seed: u64,
) -> Result<Dataset, SelectError> {
    let invalid = |reason: String| SelectError::InvalidGeneratorParams { reason };
    if n_per_class == 0 {
        return Err(invalid("samples per class must be at least 1".into()));
    }
    if n_features == 0 {
        return Err(invalid("feature count must be at least 1".into()));
    }
    if n_informative > n_features {
        return Err(invalid(format!(
            "{n_informative} informative features exceed {n_features} features"
        )));
    }
    if !shift.is_finite() {
        return Err(invalid(format!("shift {shift} is not finite")));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_samples = 2 * n_per_class;
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let label = if i % 2 == 0 { Label::Positive } else { Label::Negative };
        let offset = f64::from(label.value()) * shift / 2.0;
        let row = (0..n_features)
            .map(|f| {
                let noise: f64 = rng.sample(StandardNormal);
                if f < n_informative { noise + offset } else { noise }
            })
            .collect();
        features.push(row);
        labels.push(label);
    }

    Dataset::new(features, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_and_balance() {
        let data = make_classification(50, 20, 5, 1.5, 0).unwrap();
        assert_eq!(data.n_samples(), 100);
        assert_eq!(data.n_features(), 20);
        assert_eq!(data.class_count(Label::Positive), 50);
        assert_eq!(data.class_count(Label::Negative), 50);
    }

    #[test]
    fn informative_columns_are_shifted() {
        let data = make_classification(500, 3, 1, 2.0, 9).unwrap();
        let mean = |label: Label, column: usize| {
            let values: Vec<f64> = data
                .features()
                .iter()
                .zip(data.labels())
                .filter(|(_, l)| **l == label)
                .map(|(row, _)| row[column])
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        };
        let gap = mean(Label::Positive, 0) - mean(Label::Negative, 0);
        assert!((gap - 2.0).abs() < 0.3, "gap = {gap}");
        let noise_gap = mean(Label::Positive, 2) - mean(Label::Negative, 2);
        assert!(noise_gap.abs() < 0.3, "noise gap = {noise_gap}");
    }

    #[test]
    fn deterministic_per_seed() {
        let a = make_classification(10, 4, 2, 1.0, 3).unwrap();
        let b = make_classification(10, 4, 2, 1.0, 3).unwrap();
        let c = make_classification(10, 4, 2, 1.0, 4).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn noise_columns_are_standard_normal() {
        let data = make_classification(2000, 2, 0, 0.0, 21).unwrap();
        let values: Vec<f64> = data.features().iter().map(|row| row[1]).collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.1, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.1, "variance = {var}");
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(make_classification(0, 4, 1, 1.0, 0).is_err());
        assert!(make_classification(5, 0, 0, 1.0, 0).is_err());
        assert!(make_classification(5, 4, 5, 1.0, 0).is_err());
        assert!(make_classification(5, 4, 1, f64::NAN, 0).is_err());
    }
}
