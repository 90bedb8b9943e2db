use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a feature index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a node inside a tree's node arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Impurity of the samples reaching a node, under the tree's criterion.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize,
)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return `true` when every sample at the node has the same class.
    #[must_use]
    pub fn is_pure(self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// A node in a decision tree arena.
///
/// Children are referenced by [`NodeIndex`]; the root always sits at index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split: samples with `value <= threshold` go left.
    Split {
        /// Feature compared at this node.
        feature: FeatureIndex,
        /// Midpoint between the two closest values on either side of the cut.
        threshold: f64,
        /// Left child.
        left: NodeIndex,
        /// Right child.
        right: NodeIndex,
        /// Training samples that reached this node.
        n_samples: usize,
        /// Sample-weighted impurity decrease (MDI contribution).
        impurity_decrease: f64,
    },
    /// A terminal node.
    Leaf {
        /// Majority class; the lowest class index wins a tie.
        prediction: usize,
        /// Class frequencies of the training samples in this leaf.
        distribution: Vec<f64>,
        /// Impurity of the leaf.
        impurity: Impurity,
        /// Training samples that reached this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Impurity, Node, NodeIndex};

    #[test]
    fn feature_index_display_and_order() {
        let a = FeatureIndex::new(1);
        let b = FeatureIndex::new(5);
        assert!(a < b);
        assert_eq!(format!("{b}"), "5");
        assert_eq!(b.index(), 5);
    }

    #[test]
    fn node_index_display() {
        assert_eq!(format!("{}", NodeIndex::new(12)), "#12");
    }

    #[test]
    fn impurity_purity_and_display() {
        assert!(Impurity::new(0.0).is_pure());
        assert!(!Impurity::new(0.25).is_pure());
        assert_eq!(format!("{}", Impurity::new(0.5)), "0.500000");
    }

    #[test]
    fn node_accessors() {
        let leaf = Node::Leaf {
            prediction: 1,
            distribution: vec![0.25, 0.75],
            impurity: Impurity::new(0.375),
            n_samples: 8,
        };
        let split = Node::Split {
            feature: FeatureIndex::new(3),
            threshold: 0.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            n_samples: 20,
            impurity_decrease: 4.0,
        };
        assert!(leaf.is_leaf());
        assert!(!split.is_leaf());
        assert_eq!(leaf.n_samples(), 8);
        assert_eq!(split.n_samples(), 20);
    }
}
