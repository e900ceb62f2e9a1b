//! Class rebalancing by random oversampling.
//!
//! Minority classes are topped up to the majority-class count by drawing their
//! rows with replacement. The original rows are kept first, in their input
//! order, followed by the drawn duplicates class by class in ascending code
//! order.
//!
//! ```rust
//! use symptomcheck_train::{class_counts, RandomOverSampler};
//! use scirs2_core::ndarray::{array, Array2};
//!
//! let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
//! let y = array![0, 0, 0, 1];
//!
//! let (x_res, y_res) = RandomOverSampler::new(42).fit_resample(&x, &y).unwrap();
//! assert_eq!(x_res.nrows(), 6);
//! assert!(class_counts(&y_res).values().all(|&c| c == 3));
//! ```

use scirs2_core::ndarray::{Array1, Array2, Axis};
use scirs2_core::random::{Rng, SeedableRng, StdRng};
use std::collections::BTreeMap;

use crate::error::{TrainError, TrainResult};

/// Row count per class code, ordered by code.
pub fn class_counts(labels: &Array1<usize>) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &label in labels.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Random oversampler equalizing per-class row counts.
#[derive(Debug, Clone)]
pub struct RandomOverSampler {
    /// Random seed
    pub seed: u64,
}

impl Default for RandomOverSampler {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl RandomOverSampler {
    /// Create a new oversampler with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Indices into the input that make up the rebalanced table.
    pub fn sample_indices(&self, labels: &Array1<usize>) -> TrainResult<Vec<usize>> {
        if labels.is_empty() {
            return Err(TrainError::EmptyInput(
                "Cannot resample an empty table".to_string(),
            ));
        }

        let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in labels.iter().enumerate() {
            class_indices.entry(label).or_default().push(idx);
        }

        let target = class_indices.values().map(Vec::len).max().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut selected: Vec<usize> = (0..labels.len()).collect();

        for indices in class_indices.values() {
            let deficit = target - indices.len();
            selected.extend((0..deficit).map(|_| indices[rng.gen_range(0..indices.len())]));
        }

        Ok(selected)
    }

    /// Rebalance `features` and `labels` so every class has the majority count.
    pub fn fit_resample(
        &self,
        features: &Array2<f64>,
        labels: &Array1<usize>,
    ) -> TrainResult<(Array2<f64>, Array1<usize>)> {
        if features.nrows() == 0 {
            return Err(TrainError::EmptyInput(
                "Cannot resample an empty table".to_string(),
            ));
        }
        if features.nrows() != labels.len() {
            return Err(TrainError::LabelFeatureSizeMismatch {
                features: features.nrows(),
                labels: labels.len(),
            });
        }

        let indices = self.sample_indices(labels)?;
        let resampled_features = features.select(Axis(0), &indices);
        let resampled_labels = labels.select(Axis(0), &indices);

        tracing::debug!(
            input_rows = features.nrows(),
            output_rows = indices.len(),
            "Oversampled minority classes"
        );

        Ok((resampled_features, resampled_labels))
    }
}
