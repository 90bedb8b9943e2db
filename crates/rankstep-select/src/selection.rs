//! Final feature selection on the full dataset.

use rankstep_rf::FeatureRanking;
use tracing::{info, instrument};

use crate::classifier::{Classifier, TrainedModel};
use crate::dataset::Dataset;
use crate::error::SelectError;

/// A selected feature with its importance and 1-based rank.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Zero-based column index in the dataset.
    pub index: usize,
    /// Importance score from the full-data fit.
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Fit `classifier` on the whole dataset and return its `k` top-ranked features.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SelectError::ZeroFeatureStep`] | `k` is zero |
/// | [`SelectError::FeatureStepOutOfRange`] | `k` exceeds the feature count |
/// | [`SelectError::FinalFit`] | the classifier fails |
/// | [`SelectError::ImportanceCountMismatch`] | the model returns the wrong number of importances |
#[instrument(skip(dataset, classifier), fields(n_features = dataset.n_features()))]
pub fn select_features<C: Classifier>(
    dataset: &Dataset,
    classifier: &C,
    k: usize,
    seed: u64,
) -> Result<Vec<RankedFeature>, SelectError> {
    if k == 0 {
        return Err(SelectError::ZeroFeatureStep { position: 0 });
    }
    if k > dataset.n_features() {
        return Err(SelectError::FeatureStepOutOfRange {
            step: k,
            n_features: dataset.n_features(),
        });
    }

    let model = classifier
        .fit(dataset.features(), dataset.labels(), seed)
        .map_err(|e| SelectError::FinalFit { source: Box::new(e) })?;
    let importances = model.feature_importances();
    if importances.len() != dataset.n_features() {
        return Err(SelectError::ImportanceCountMismatch {
            expected: dataset.n_features(),
            got: importances.len(),
        });
    }

    let ranking = FeatureRanking::from_importances(&importances);
    let selected: Vec<RankedFeature> = ranking
        .top(k)
        .iter()
        .enumerate()
        .map(|(i, &feature)| RankedFeature {
            name: dataset.feature_names()[feature.index()].clone(),
            index: feature.index(),
            importance: ranking.importance(feature),
            rank: i + 1,
        })
        .collect();

    info!(k, top = %selected[0].name, "features selected");
    Ok(selected)
}
