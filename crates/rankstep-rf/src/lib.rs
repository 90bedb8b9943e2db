//! Random Forest classification with impurity-based feature ranking.
//!
//! Provides a hand-rolled Random Forest classifier with CART decision trees,
//! Gini/Entropy split criteria, bootstrap sampling, parallel training via
//! rayon, and Mean Decrease in Impurity feature importances.

mod config;
mod criterion;
mod data;
mod error;
mod forest;
mod importance;
mod node;
mod predict;
mod split;
mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use criterion::SplitCriterion;
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::FeatureRanking;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::ClassDistribution;
pub use tree::{DecisionTree, DecisionTreeConfig};
