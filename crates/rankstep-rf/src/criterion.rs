use crate::node::Impurity;

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: `1 - Σ p_i²`.
    Gini,
    /// Shannon entropy in bits: `-Σ p_i · log2(p_i)`.
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// An empty node is pure.
    #[must_use]
    pub fn impurity(self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let proportions = class_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64 / n);
        let value = match self {
            SplitCriterion::Gini => 1.0 - proportions.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -proportions.map(|p| p * p.log2()).sum::<f64>(),
        };
        // Guard against -0.0 and rounding just below zero on pure nodes.
        Impurity::new(value.max(0.0))
    }
}

impl std::str::FromStr for SplitCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gini" => Ok(SplitCriterion::Gini),
            "entropy" => Ok(SplitCriterion::Entropy),
            other => Err(format!("unknown split criterion: {other} (expected gini or entropy)")),
        }
    }
}
