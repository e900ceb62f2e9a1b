//! Random forest: bagged decision trees with internal plurality voting.

use crate::model::{validate_prediction_input, validate_training_data, Classifier};
use crate::tree::{DecisionTreeClassifier, MaxFeatures, TreeConfig};
use crate::vote::combine;
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{Array1, ArrayView1, ArrayView2};
use scirs2_core::random::{Rng, SeedableRng, StdRng};
use serde::{Deserialize, Serialize};

/// Bootstrap sample generation for ensemble members.
#[derive(Debug, Clone)]
pub struct BaggingHelper {
    /// Number of bootstrap samples.
    pub n_estimators: usize,
    /// Random seed for reproducibility.
    pub random_seed: u64,
}

impl BaggingHelper {
    /// Create a new bagging helper.
    ///
    /// # Arguments
    /// * `n_estimators` - Number of bootstrap samples
    /// * `random_seed` - Random seed
    pub fn new(n_estimators: usize, random_seed: u64) -> TrainResult<Self> {
        if n_estimators == 0 {
            return Err(TrainError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }
        Ok(Self {
            n_estimators,
            random_seed,
        })
    }

    /// Seed for one estimator's bootstrap draw.
    pub fn estimator_seed(&self, estimator_idx: usize) -> u64 {
        self.random_seed.wrapping_add(estimator_idx as u64)
    }

    /// Generate bootstrap sample indices (with replacement).
    pub fn generate_bootstrap_indices(&self, n_samples: usize, estimator_idx: usize) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(self.estimator_seed(estimator_idx));

        (0..n_samples)
            .map(|_| rng.gen_range(0..n_samples))
            .collect()
    }

    /// Seed for one estimator's tree, decorrelated from its bootstrap draw.
    pub fn tree_seed(&self, estimator_idx: usize) -> u64 {
        self.estimator_seed(estimator_idx) ^ 0x9E37_79B9_7F4A_7C15
    }
}

/// Configuration for [`RandomForestClassifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Maximum depth per tree; unlimited when `None`.
    pub max_depth: Option<usize>,
    /// Minimum number of rows required to split a node.
    pub min_samples_split: usize,
    /// Features examined per split.
    pub max_features: MaxFeatures,
    /// Seed for bootstrap draws and per-tree feature order.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            seed: 42,
        }
    }
}

/// Random forest classifier.
#[derive(Debug, Clone, Default)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trees: Vec<DecisionTreeClassifier>,
    n_features: usize,
}

impl RandomForestClassifier {
    /// Create an untrained forest.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Number of fitted trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> &str {
        "Random Forest"
    }

    fn train(
        &mut self,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> TrainResult<()> {
        validate_training_data(features, labels)?;
        let bagging = BaggingHelper::new(self.config.n_estimators, self.config.seed)?;
        let n_samples = features.nrows();

        let mut trees = Vec::with_capacity(bagging.n_estimators);
        for estimator_idx in 0..bagging.n_estimators {
            let rows = bagging.generate_bootstrap_indices(n_samples, estimator_idx);
            let mut tree = DecisionTreeClassifier::new(TreeConfig {
                max_depth: self.config.max_depth,
                min_samples_split: self.config.min_samples_split,
                max_features: self.config.max_features,
                seed: bagging.tree_seed(estimator_idx),
            });
            tree.train_on_rows(features, labels, rows)?;
            trees.push(tree);
        }

        // Replace the previous fit only once every tree has grown.
        self.trees = trees;
        self.n_features = features.ncols();

        tracing::debug!(trees = self.trees.len(), "Fitted random forest");
        Ok(())
    }

    fn predict(&self, features: &ArrayView2<f64>) -> TrainResult<Array1<usize>> {
        if self.trees.is_empty() {
            return Err(TrainError::ModelNotTrained(self.name().to_string()));
        }
        validate_prediction_input(features, self.n_features)?;

        let per_tree = self
            .trees
            .iter()
            .map(|tree| tree.predict(features))
            .collect::<TrainResult<Vec<_>>>()?;

        (0..features.nrows())
            .map(|i| {
                let votes: Vec<usize> = per_tree.iter().map(|p| p[i]).collect();
                combine(&votes)
            })
            .collect()
    }

    fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray::{array, Array2};

    #[test]
    fn test_bootstrap_indices() {
        let bagging = BaggingHelper::new(3, 42).unwrap();
        let indices = bagging.generate_bootstrap_indices(20, 0);

        assert_eq!(indices.len(), 20);
        assert!(indices.iter().all(|&i| i < 20));
        assert_eq!(indices, bagging.generate_bootstrap_indices(20, 0));
    }

    #[test]
    fn test_tree_seed_differs_from_bootstrap_seed() {
        let bagging = BaggingHelper::new(3, 42).unwrap();
        for idx in 0..3 {
            assert_ne!(bagging.tree_seed(idx), bagging.estimator_seed(idx));
        }
        assert_ne!(bagging.tree_seed(0), bagging.tree_seed(1));
    }

    #[test]
    fn test_bagging_invalid() {
        assert!(BaggingHelper::new(0, 42).is_err());
    }

    #[test]
    fn test_forest_separates_dominant_feature() {
        // Class k is marked by feature k being set.
        let x = Array2::from_shape_fn((30, 3), |(i, j)| if i % 3 == j { 1.0 } else { 0.0 });
        let y = Array1::from_shape_fn(30, |i| i % 3);

        let mut forest = RandomForestClassifier::new(ForestConfig {
            n_estimators: 15,
            ..ForestConfig::default()
        });
        forest.train(&x.view(), &y.view()).unwrap();

        assert_eq!(forest.num_trees(), 15);
        assert_eq!(forest.predict(&x.view()).unwrap(), y);
    }

    #[test]
    fn test_nan_column_terminates() {
        let x = array![[0.0, 1.0], [f64::NAN, 0.0], [f64::NAN, 1.0], [0.0, 0.0]];
        let y = array![0, 1, 0, 1];
        let mut forest = RandomForestClassifier::new(ForestConfig {
            n_estimators: 4,
            ..ForestConfig::default()
        });
        forest.train(&x.view(), &y.view()).unwrap();

        assert_eq!(forest.num_trees(), 4);
        assert_eq!(forest.predict(&x.view()).unwrap().len(), 4);
    }

    #[test]
    fn test_predict_before_train() {
        let forest = RandomForestClassifier::default();
        assert!(matches!(
            forest.predict(&array![[0.0]].view()),
            Err(TrainError::ModelNotTrained(_))
        ));
    }
}
