//! CART decision tree classifier with Gini impurity.
//!
//! Nodes live in a flat arena; a split sends rows with `x[feature] <=
//! threshold` left. Thresholds are midpoints between consecutive distinct
//! feature values, so 0/1 symptoms split at 0.5.

use crate::model::{argmax, validate_prediction_input, validate_training_data, Classifier};
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{Array1, ArrayView1, ArrayView2};
use scirs2_core::random::{Rng, SeedableRng, StdRng};
use serde::{Deserialize, Serialize};

/// Number of features examined when searching for a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature.
    All,
    /// `floor(sqrt(n_features))`, at least one.
    Sqrt,
    /// A fixed count, capped at the number of features.
    Count(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Configuration for [`DecisionTreeClassifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum depth; unlimited when `None`.
    pub max_depth: Option<usize>,
    /// Minimum number of rows required to split a node.
    pub min_samples_split: usize,
    /// Features examined per split.
    pub max_features: MaxFeatures,
    /// Seed for the feature order at each split.
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::All,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct FittedTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl FittedTree {
    fn predict_row(&self, row: &ArrayView1<f64>) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Best split found for a node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Grows one tree; borrowed data plus the arena under construction.
struct TreeBuilder<'a> {
    features: &'a ArrayView2<'a, f64>,
    labels: &'a ArrayView1<'a, usize>,
    n_classes: usize,
    config: &'a TreeConfig,
    max_features: usize,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in rows {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    fn gini(counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        1.0 - counts
            .iter()
            .map(|&c| {
                let p = c as f64 / total;
                p * p
            })
            .sum::<f64>()
    }

    fn majority(counts: &[usize]) -> usize {
        let as_f64: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        argmax(&as_f64)
    }

    /// Weighted child impurity of the best threshold on `feature`.
    fn best_threshold(&self, rows: &[usize], feature: usize) -> Option<(f64, f64)> {
        let mut sorted: Vec<(f64, usize)> = rows
            .iter()
            .map(|&i| (self.features[[i, feature]], self.labels[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = sorted.len();
        let mut left = vec![0usize; self.n_classes];
        let mut right = vec![0usize; self.n_classes];
        for &(_, label) in &sorted {
            right[label] += 1;
        }

        let mut best: Option<(f64, f64)> = None;
        for i in 0..total - 1 {
            let (value, label) = sorted[i];
            left[label] += 1;
            right[label] -= 1;

            let next = sorted[i + 1].0;
            if next <= value {
                continue;
            }
            // Midpoints involving NaN or infinities cannot separate rows.
            let mut threshold = value + (next - value) / 2.0;
            if threshold >= next {
                threshold = value;
            }
            if !threshold.is_finite() {
                continue;
            }
            let n_left = i + 1;
            let n_right = total - n_left;
            let impurity = (n_left as f64 * Self::gini(&left, n_left)
                + n_right as f64 * Self::gini(&right, n_right))
                / total as f64;
            if best.map_or(true, |(_, b)| impurity < b) {
                best = Some((threshold, impurity));
            }
        }
        best
    }

    fn find_split(&mut self, rows: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.features.ncols();
        let mut order: Vec<usize> = (0..n_features).collect();
        for i in (1..n_features).rev() {
            let j = self.rng.gen_range(0..=i);
            order.swap(i, j);
        }

        // Keep drawing features past `max_features` until a usable split
        // turns up, so constant features do not force an early leaf.
        let mut best: Option<SplitCandidate> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            if let Some((threshold, impurity)) = self.best_threshold(rows, feature) {
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }
        best
    }

    fn build(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&rows);
        let node_impurity = Self::gini(&counts, rows.len());
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            class: Self::majority(&counts),
        });

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if node_impurity <= 0.0 || depth_reached || rows.len() < self.config.min_samples_split {
            return idx;
        }

        let Some(split) = self.find_split(&rows) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.features[[i, split.feature]] <= split.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return idx;
        }

        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

/// CART decision tree classifier.
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeClassifier {
    config: TreeConfig,
    tree: Option<FittedTree>,
}

impl DecisionTreeClassifier {
    /// Create an untrained tree.
    pub fn new(config: TreeConfig) -> Self {
        Self { config, tree: None }
    }

    /// Number of nodes in the fitted tree.
    pub fn node_count(&self) -> usize {
        self.tree.as_ref().map_or(0, |t| t.nodes.len())
    }

    /// Depth of the fitted tree (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        self.tree.as_ref().map_or(0, |t| depth_of(&t.nodes, 0))
    }

    /// Fit on a subset of rows, as used for bootstrap samples.
    pub(crate) fn train_on_rows(
        &mut self,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
        rows: Vec<usize>,
    ) -> TrainResult<()> {
        validate_training_data(features, labels)?;
        if rows.is_empty() {
            return Err(TrainError::EmptyInput("No rows to grow a tree".to_string()));
        }
        if self.config.min_samples_split < 2 {
            return Err(TrainError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }

        let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
        let mut builder = TreeBuilder {
            features,
            labels,
            n_classes,
            config: &self.config,
            max_features: self.config.max_features.resolve(features.ncols()),
            rng: StdRng::seed_from_u64(self.config.seed),
            nodes: Vec::new(),
        };
        builder.build(rows, 0);

        self.tree = Some(FittedTree {
            nodes: builder.nodes,
            n_features: features.ncols(),
        });
        Ok(())
    }
}

impl Classifier for DecisionTreeClassifier {
    fn name(&self) -> &str {
        "Decision Tree"
    }

    fn train(
        &mut self,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> TrainResult<()> {
        let rows = (0..features.nrows()).collect();
        self.train_on_rows(features, labels, rows)
    }

    fn predict(&self, features: &ArrayView2<f64>) -> TrainResult<Array1<usize>> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| TrainError::ModelNotTrained(self.name().to_string()))?;
        validate_prediction_input(features, tree.n_features)?;

        Ok(features
            .rows()
            .into_iter()
            .map(|row| tree.predict_row(&row))
            .collect())
    }

    fn is_trained(&self) -> bool {
        self.tree.is_some()
    }
}
