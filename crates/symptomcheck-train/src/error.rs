//! Error types for training and inference operations.

use thiserror::Error;

/// Errors that can occur while preparing data, training or predicting.
#[derive(Error, Debug)]
pub enum TrainError {
    /// Label not present in the encoder vocabulary.
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Class code outside `[0, num_classes)`.
    #[error("Index {index} out of range for {num_classes} classes")]
    IndexOutOfRange {
        /// Offending code.
        index: usize,
        /// Size of the vocabulary.
        num_classes: usize,
    },

    /// Operation received no rows or no values.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Feature rows and labels disagree in length.
    #[error("Label/feature size mismatch: {features} feature rows vs {labels} labels")]
    LabelFeatureSizeMismatch {
        /// Number of feature rows.
        features: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Prediction requested from a model that was never trained.
    #[error("Model '{0}' has not been trained")]
    ModelNotTrained(String),

    /// A candidate model failed during cross-validation.
    #[error("Training of '{model}' failed: {source}")]
    TrainingFailure {
        /// Name of the failing candidate.
        model: String,
        /// Underlying cause.
        #[source]
        source: Box<TrainError>,
    },

    /// Error with invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed dataset content.
    #[error("Dataset error: {0}")]
    DatasetError(String),

    /// Error in metrics computation.
    #[error("Metrics error: {0}")]
    MetricsError(String),

    /// I/O failure while reading data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrainError {
    /// Wrap an error as a training failure attributed to `model`.
    pub fn training_failure(model: impl Into<String>, source: TrainError) -> Self {
        TrainError::TrainingFailure {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for training operations.
pub type TrainResult<T> = Result<T, TrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_failure_display() {
        let err = TrainError::training_failure("Random Forest", TrainError::EmptyInput("x".into()));
        let msg = err.to_string();
        assert!(msg.contains("Random Forest"));
        assert!(msg.contains("Empty input"));
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = TrainError::IndexOutOfRange {
            index: 7,
            num_classes: 3,
        };
        assert_eq!(err.to_string(), "Index 7 out of range for 3 classes");
    }
}
