//! Cross-validation over candidate model families.
//!
//! Splitters produce disjoint train/test index sets whose test folds
//! partition the input exactly once. [`CrossValidator`] runs one fresh model
//! per fold and isolates failures per candidate so that one broken family
//! never hides the results of the others.

use crate::metrics::accuracy;
use crate::model::ClassifierFactory;
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{ArrayView1, ArrayView2, Axis};
use scirs2_core::random::{Rng, SeedableRng, StdRng};
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Trait for cross-validation splitting strategies.
pub trait CrossValidationSplit: Send + Sync {
    /// Get the number of splits.
    fn num_splits(&self) -> usize;

    /// Get the train/test indices for a specific fold.
    ///
    /// # Arguments
    /// * `fold` - Fold index (0 to num_splits - 1)
    /// * `labels` - Class code of every sample
    ///
    /// # Returns
    /// (train_indices, test_indices)
    fn get_split(&self, fold: usize, labels: &[usize]) -> TrainResult<(Vec<usize>, Vec<usize>)>;
}

fn check_fold(fold: usize, n_splits: usize, n_samples: usize) -> TrainResult<()> {
    if fold >= n_splits {
        return Err(TrainError::InvalidParameter(format!(
            "fold {} is out of range [0, {})",
            fold, n_splits
        )));
    }
    if n_samples < n_splits {
        return Err(TrainError::InvalidParameter(format!(
            "cannot split {} samples into {} folds",
            n_samples, n_splits
        )));
    }
    Ok(())
}

fn shuffle(indices: &mut [usize], rng: &mut StdRng) {
    for i in (1..indices.len()).rev() {
        let j = rng.gen_range(0..=i);
        indices.swap(i, j);
    }
}

/// Cut `indices` into contiguous folds of the given sizes, returning the
/// piece at `fold` and everything else.
fn take_fold(indices: &[usize], sizes: &[usize], fold: usize) -> (Vec<usize>, Vec<usize>) {
    let start: usize = sizes[..fold].iter().sum();
    let end = start + sizes[fold];
    let mut train = indices[..start].to_vec();
    train.extend_from_slice(&indices[end..]);
    (train, indices[start..end].to_vec())
}

/// Stratified K-fold cross-validation.
///
/// Each class is spread over the folds as evenly as integer division allows.
/// A class's leftover rows go to the folds following the previous class's
/// leftovers, so whole-fold sizes differ by at most one.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    /// Number of folds.
    pub n_splits: usize,
    /// Whether to shuffle each class before splitting.
    pub shuffle: bool,
    /// Random seed for shuffling.
    pub random_seed: u64,
}

impl StratifiedKFold {
    /// Create a shuffled stratified splitter; `n_splits` must be at least 2.
    pub fn new(n_splits: usize) -> TrainResult<Self> {
        if n_splits < 2 {
            return Err(TrainError::InvalidParameter(
                "n_splits must be at least 2".to_string(),
            ));
        }
        Ok(Self {
            n_splits,
            shuffle: true,
            random_seed: 42,
        })
    }

    /// Set random seed for shuffling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Keep rows in input order within each class.
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }
}

impl CrossValidationSplit for StratifiedKFold {
    fn num_splits(&self) -> usize {
        self.n_splits
    }

    fn get_split(&self, fold: usize, labels: &[usize]) -> TrainResult<(Vec<usize>, Vec<usize>)> {
        check_fold(fold, self.n_splits, labels.len())?;

        let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            class_indices.entry(label).or_default().push(i);
        }

        let mut rng = StdRng::seed_from_u64(self.random_seed);
        let mut train_indices = Vec::with_capacity(labels.len());
        let mut test_indices = Vec::new();
        let mut offset = 0;

        for indices in class_indices.values_mut() {
            if self.shuffle {
                shuffle(indices, &mut rng);
            }

            let base = indices.len() / self.n_splits;
            let remainder = indices.len() % self.n_splits;
            let sizes: Vec<usize> = (0..self.n_splits)
                .map(|f| base + usize::from((f + self.n_splits - offset) % self.n_splits < remainder))
                .collect();
            offset = (offset + remainder) % self.n_splits;

            let (train, test) = take_fold(indices, &sizes, fold);
            train_indices.extend(train);
            test_indices.extend(test);
        }

        Ok((train_indices, test_indices))
    }
}

/// Per-fold accuracy of one candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossValidationResults {
    /// Scores for each fold, in fold-index order.
    pub fold_scores: Vec<f64>,
}

impl CrossValidationResults {
    /// Wrap fold scores.
    pub fn new(fold_scores: Vec<f64>) -> Self {
        Self { fold_scores }
    }

    /// Get mean score across all folds.
    pub fn mean_score(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return 0.0;
        }
        self.fold_scores.iter().sum::<f64>() / self.fold_scores.len() as f64
    }

    /// Sample standard deviation of fold scores.
    pub fn std_score(&self) -> f64 {
        if self.fold_scores.len() <= 1 {
            return 0.0;
        }

        let mean = self.mean_score();
        let variance = self
            .fold_scores
            .iter()
            .map(|&score| (score - mean).powi(2))
            .sum::<f64>()
            / (self.fold_scores.len() - 1) as f64;

        variance.sqrt()
    }

    /// Get number of folds.
    pub fn num_folds(&self) -> usize {
        self.fold_scores.len()
    }
}

/// Outcome of evaluating one named candidate.
#[derive(Debug)]
pub struct CandidateReport {
    /// Candidate name.
    pub name: String,
    /// Fold scores, or the attributed failure.
    pub result: TrainResult<CrossValidationResults>,
}

/// A named model family to evaluate.
pub struct Candidate<'a> {
    /// Display name used in reports and failure attribution.
    pub name: &'a str,
    /// Builds a fresh, untrained model per fold.
    pub factory: &'a ClassifierFactory,
}

/// Runs a splitter against fresh model instances.
#[derive(Debug, Clone)]
pub struct CrossValidator<S> {
    splitter: S,
}

impl CrossValidator<StratifiedKFold> {
    /// Shuffled stratified validation with `n_splits` folds.
    pub fn stratified(n_splits: usize, seed: u64) -> TrainResult<Self> {
        Ok(Self::new(StratifiedKFold::new(n_splits)?.with_seed(seed)))
    }
}

impl<S: CrossValidationSplit> CrossValidator<S> {
    /// Create a validator around a splitter.
    pub fn new(splitter: S) -> Self {
        Self { splitter }
    }

    /// The underlying splitter.
    pub fn splitter(&self) -> &S {
        &self.splitter
    }

    /// Train one fresh model per fold and score it on the held-out fold.
    ///
    /// Every failure is reported as [`TrainError::TrainingFailure`] naming
    /// `name`.
    pub fn evaluate(
        &self,
        name: &str,
        factory: &ClassifierFactory,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> TrainResult<CrossValidationResults> {
        self.run_folds(factory, features, labels)
            .map(CrossValidationResults::new)
            .map_err(|e| TrainError::training_failure(name, e))
    }

    /// Evaluate every candidate, one report each, in input order.
    pub fn evaluate_all(
        &self,
        candidates: &[Candidate<'_>],
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> Vec<CandidateReport> {
        candidates
            .iter()
            .map(|candidate| {
                let result = self.evaluate(candidate.name, candidate.factory, features, labels);
                match &result {
                    Ok(scores) => tracing::info!(
                        model = candidate.name,
                        mean_accuracy = scores.mean_score(),
                        "Cross-validation finished"
                    ),
                    Err(e) => tracing::warn!(
                        model = candidate.name,
                        error = %e,
                        "Cross-validation failed"
                    ),
                }
                CandidateReport {
                    name: candidate.name.to_string(),
                    result,
                }
            })
            .collect()
    }

    fn run_folds(
        &self,
        factory: &ClassifierFactory,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> TrainResult<Vec<f64>> {
        if features.nrows() != labels.len() {
            return Err(TrainError::LabelFeatureSizeMismatch {
                features: features.nrows(),
                labels: labels.len(),
            });
        }
        let codes = labels.to_vec();

        let run_fold = |fold: usize| -> TrainResult<f64> {
            let (train, test) = self.splitter.get_split(fold, &codes)?;
            let x_train = features.select(Axis(0), &train);
            let y_train = labels.select(Axis(0), &train);
            let x_test = features.select(Axis(0), &test);
            let y_test = labels.select(Axis(0), &test);

            let mut model = factory();
            model.train(&x_train.view(), &y_train.view())?;
            let predictions = model.predict(&x_test.view())?;
            let score = accuracy(&y_test.view(), &predictions.view())?;
            tracing::debug!(model = model.name(), fold, score, "Fold scored");
            Ok(score)
        };

        let folds = 0..self.splitter.num_splits();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<TrainResult<f64>> = folds.into_par_iter().map(run_fold).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<TrainResult<f64>> = folds.map(run_fold).collect();

        outcomes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Classifier;
    use crate::naive_bayes::GaussianNaiveBayes;
    use scirs2_core::ndarray::{Array1, Array2};

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_stratified_folds_partition_input() {
        let skfold = StratifiedKFold::new(5).unwrap();
        let labels: Vec<usize> = (0..37).map(|i| i % 4).collect();

        let mut seen = Vec::new();
        for fold in 0..5 {
            let (train, test) = skfold.get_split(fold, &labels).unwrap();
            assert_eq!(train.len() + test.len(), labels.len());
            assert!(test.iter().all(|i| !train.contains(i)));
            seen.extend(test);
        }
        assert_eq!(sorted(seen), (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratified_invalid() {
        assert!(StratifiedKFold::new(1).is_err());
        let skfold = StratifiedKFold::new(3).unwrap();
        assert!(skfold.get_split(5, &[0; 10]).is_err());
        assert!(skfold.get_split(0, &[0; 2]).is_err());
    }

    #[test]
    fn test_stratified_preserves_class_balance() {
        let skfold = StratifiedKFold::new(3).unwrap();
        let labels = vec![0, 0, 0, 1, 1, 1, 2, 2, 2];

        for fold in 0..3 {
            let (_, test) = skfold.get_split(fold, &labels).unwrap();
            let classes = sorted(test.iter().map(|&i| labels[i]).collect());
            assert_eq!(classes, vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_stratified_remainders_rotate() {
        // Three classes of 4 rows over 3 folds: each class has one leftover.
        let skfold = StratifiedKFold::new(3).unwrap().without_shuffle();
        let labels: Vec<usize> = (0..12).map(|i| i / 4).collect();

        let sizes: Vec<usize> = (0..3)
            .map(|fold| skfold.get_split(fold, &labels).unwrap().1.len())
            .collect();
        assert_eq!(sizes, vec![4, 4, 4]);
    }

    #[test]
    fn test_cv_results() {
        let results = CrossValidationResults::new(vec![0.85, 0.90, 0.88]);
        assert_eq!(results.num_folds(), 3);
        assert!((results.mean_score() - 0.8766666).abs() < 1e-6);
        assert!(results.std_score() > 0.0);

        let empty = CrossValidationResults::default();
        assert_eq!(empty.mean_score(), 0.0);
        assert_eq!(empty.std_score(), 0.0);
    }

    fn separable() -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| if i % 2 == j { 1.0 } else { 0.0 });
        let y = Array1::from_shape_fn(20, |i| i % 2);
        (x, y)
    }

    #[test]
    fn test_evaluate_scores_every_fold() {
        let (x, y) = separable();
        let validator = CrossValidator::stratified(5, 42).unwrap();
        let factory = || Box::new(GaussianNaiveBayes::default()) as Box<dyn Classifier>;

        let results = validator
            .evaluate("Naive Bayes", &factory, &x.view(), &y.view())
            .unwrap();
        assert_eq!(results.fold_scores, vec![1.0; 5]);
    }

    #[test]
    fn test_failing_candidate_is_isolated() {
        struct Broken;
        impl Classifier for Broken {
            fn name(&self) -> &str {
                "Broken"
            }
            fn train(&mut self, _: &ArrayView2<f64>, _: &ArrayView1<usize>) -> TrainResult<()> {
                Err(TrainError::InvalidParameter("always fails".to_string()))
            }
            fn predict(&self, _: &ArrayView2<f64>) -> TrainResult<Array1<usize>> {
                Err(TrainError::ModelNotTrained("Broken".to_string()))
            }
            fn is_trained(&self) -> bool {
                false
            }
        }

        let (x, y) = separable();
        let validator = CrossValidator::stratified(5, 42).unwrap();
        let broken = || Box::new(Broken) as Box<dyn Classifier>;
        let working = || Box::new(GaussianNaiveBayes::default()) as Box<dyn Classifier>;

        let reports = validator.evaluate_all(
            &[
                Candidate {
                    name: "Broken",
                    factory: &broken,
                },
                Candidate {
                    name: "Naive Bayes",
                    factory: &working,
                },
            ],
            &x.view(),
            &y.view(),
        );

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "Broken");
        assert!(matches!(
            &reports[0].result,
            Err(TrainError::TrainingFailure { model, .. }) if model == "Broken"
        ));
        assert!(reports[1].result.is_ok());
    }

    #[test]
    fn test_evaluate_size_mismatch() {
        let validator = CrossValidator::stratified(2, 42).unwrap();
        let factory = || Box::new(GaussianNaiveBayes::default()) as Box<dyn Classifier>;
        let x = Array2::<f64>::zeros((4, 1));
        let y = Array1::<usize>::zeros(3);

        let err = validator
            .evaluate("Naive Bayes", &factory, &x.view(), &y.view())
            .unwrap_err();
        assert!(matches!(err, TrainError::TrainingFailure { .. }));
    }
}
