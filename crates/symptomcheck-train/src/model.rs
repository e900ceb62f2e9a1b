//! Classifier interface shared by every ensemble member.

use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{Array1, ArrayView1, ArrayView2};

/// Trait for trainable classifiers over dense feature rows.
///
/// Training replaces any prior fit state entirely; there is no incremental
/// update. Predicting before training fails with
/// [`TrainError::ModelNotTrained`].
pub trait Classifier {
    /// Human-readable model name, used in reports and error attribution.
    fn name(&self) -> &str;

    /// Fit the model to `features` (samples x features) and class codes.
    fn train(&mut self, features: &ArrayView2<f64>, labels: &ArrayView1<usize>)
        -> TrainResult<()>;

    /// Predict a class code for every row of `features`.
    fn predict(&self, features: &ArrayView2<f64>) -> TrainResult<Array1<usize>>;

    /// Whether `train` has completed successfully.
    fn is_trained(&self) -> bool;

    /// Predict the class code of a single feature row.
    fn predict_row(&self, row: &ArrayView1<f64>) -> TrainResult<usize> {
        let batch = row.view().insert_axis(scirs2_core::ndarray::Axis(0));
        let predictions = self.predict(&batch)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| TrainError::EmptyInput("No prediction produced".to_string()))
    }
}

/// Factory producing fresh, untrained classifiers.
pub type ClassifierFactory = dyn Fn() -> Box<dyn Classifier> + Sync;

/// Check a training table before fitting.
pub(crate) fn validate_training_data(
    features: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
) -> TrainResult<()> {
    if features.nrows() == 0 {
        return Err(TrainError::EmptyInput(
            "Training table has no rows".to_string(),
        ));
    }
    if features.nrows() != labels.len() {
        return Err(TrainError::LabelFeatureSizeMismatch {
            features: features.nrows(),
            labels: labels.len(),
        });
    }
    Ok(())
}

/// Check a prediction batch against the feature width seen in training.
pub(crate) fn validate_prediction_input(
    features: &ArrayView2<f64>,
    expected_features: usize,
) -> TrainResult<()> {
    if features.ncols() != expected_features {
        return Err(TrainError::InvalidParameter(format!(
            "Expected {} features, got {}",
            expected_features,
            features.ncols()
        )));
    }
    Ok(())
}

/// Index of the largest value; the first one wins on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
