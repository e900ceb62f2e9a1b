//! Label encoding between disease names and dense class codes.

use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::Array1;
use std::collections::HashMap;

/// Label encoder for converting string labels to integers.
///
/// Codes are assigned by ascending string order of the distinct labels seen
/// in [`LabelEncoder::fit`]. Re-fitting replaces the vocabulary, so codes held
/// by previously trained models no longer line up with it.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    /// Mapping from label to integer.
    label_to_int: HashMap<String, usize>,
    /// Mapping from integer to label.
    int_to_label: Vec<String>,
}

impl LabelEncoder {
    /// Create a new, unfitted label encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder to labels.
    pub fn fit<S: AsRef<str>>(&mut self, labels: &[S]) -> &mut Self {
        let mut unique: Vec<&str> = labels.iter().map(AsRef::as_ref).collect();
        unique.sort_unstable();
        unique.dedup();

        self.label_to_int.clear();
        self.int_to_label.clear();

        for (i, label) in unique.into_iter().enumerate() {
            self.label_to_int.insert(label.to_string(), i);
            self.int_to_label.push(label.to_string());
        }

        self
    }

    /// Encode a single label.
    pub fn encode(&self, label: &str) -> TrainResult<usize> {
        self.label_to_int
            .get(label)
            .copied()
            .ok_or_else(|| TrainError::UnknownLabel(label.to_string()))
    }

    /// Decode a single class code.
    pub fn decode(&self, code: usize) -> TrainResult<&str> {
        self.int_to_label
            .get(code)
            .map(String::as_str)
            .ok_or(TrainError::IndexOutOfRange {
                index: code,
                num_classes: self.int_to_label.len(),
            })
    }

    /// Transform labels to integers.
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> TrainResult<Array1<usize>> {
        let codes = labels
            .iter()
            .map(|label| self.encode(label.as_ref()))
            .collect::<TrainResult<Vec<_>>>()?;
        Ok(Array1::from_vec(codes))
    }

    /// Inverse transform integers to labels.
    pub fn inverse_transform(&self, codes: &Array1<usize>) -> TrainResult<Vec<String>> {
        codes
            .iter()
            .map(|&code| self.decode(code).map(str::to_string))
            .collect()
    }

    /// Fit and transform in one step.
    pub fn fit_transform<S: AsRef<str>>(&mut self, labels: &[S]) -> TrainResult<Array1<usize>> {
        self.fit(labels);
        self.transform(labels)
    }

    /// Get number of classes.
    pub fn num_classes(&self) -> usize {
        self.int_to_label.len()
    }

    /// Get class labels, indexed by code.
    pub fn classes(&self) -> &[String] {
        &self.int_to_label
    }

    /// Whether `fit` has produced a non-empty vocabulary.
    pub fn is_fitted(&self) -> bool {
        !self.int_to_label.is_empty()
    }
}
