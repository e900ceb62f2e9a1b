//! Gaussian naive Bayes classifier.
//!
//! Every feature is modelled as an independent normal distribution per class.
//! Variances are smoothed by a fraction of the largest feature variance so
//! that features constant within a class (common with 0/1 symptoms) do not
//! collapse to zero width.

use crate::model::{argmax, validate_prediction_input, validate_training_data, Classifier};
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for [`GaussianNaiveBayes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaiveBayesConfig {
    /// Fraction of the largest feature variance added to every variance.
    pub var_smoothing: f64,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self {
            var_smoothing: 1e-9,
        }
    }
}

/// Fitted per-class statistics.
#[derive(Debug, Clone)]
struct GaussianParams {
    /// Class codes, ascending; row `k` of the matrices belongs to `classes[k]`.
    classes: Vec<usize>,
    log_priors: Vec<f64>,
    means: Array2<f64>,
    variances: Array2<f64>,
}

/// Gaussian naive Bayes classifier.
#[derive(Debug, Clone, Default)]
pub struct GaussianNaiveBayes {
    config: NaiveBayesConfig,
    params: Option<GaussianParams>,
}

impl GaussianNaiveBayes {
    /// Create an untrained classifier.
    pub fn new(config: NaiveBayesConfig) -> Self {
        Self {
            config,
            params: None,
        }
    }

    fn joint_log_likelihood(params: &GaussianParams, row: &ArrayView1<f64>) -> Vec<f64> {
        params
            .classes
            .iter()
            .enumerate()
            .map(|(k, _)| {
                let mut log_prob = params.log_priors[k];
                for (j, &x) in row.iter().enumerate() {
                    let var = params.variances[[k, j]];
                    let diff = x - params.means[[k, j]];
                    log_prob -= 0.5 * (2.0 * std::f64::consts::PI * var).ln();
                    log_prob -= diff * diff / (2.0 * var);
                }
                log_prob
            })
            .collect()
    }
}

impl Classifier for GaussianNaiveBayes {
    fn name(&self) -> &str {
        "Naive Bayes"
    }

    fn train(
        &mut self,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> TrainResult<()> {
        validate_training_data(features, labels)?;
        if self.config.var_smoothing < 0.0 {
            return Err(TrainError::InvalidParameter(
                "var_smoothing must be non-negative".to_string(),
            ));
        }

        let mut class_rows: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            class_rows.entry(label).or_default().push(i);
        }

        let n_samples = features.nrows() as f64;
        let n_features = features.ncols();
        let n_classes = class_rows.len();

        let max_variance = features
            .var_axis(Axis(0), 0.0)
            .iter()
            .cloned()
            .fold(0.0, f64::max);
        let epsilon = (self.config.var_smoothing * max_variance).max(f64::MIN_POSITIVE);

        let mut means = Array2::zeros((n_classes, n_features));
        let mut variances = Array2::zeros((n_classes, n_features));
        let mut log_priors = Vec::with_capacity(n_classes);

        for (k, rows) in class_rows.values().enumerate() {
            let class_features = features.select(Axis(0), rows);
            let count = rows.len() as f64;
            for j in 0..n_features {
                let column = class_features.column(j);
                let mean = column.sum() / count;
                let var = column.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / count;
                means[[k, j]] = mean;
                variances[[k, j]] = var + epsilon;
            }
            log_priors.push((count / n_samples).ln());
        }

        self.params = Some(GaussianParams {
            classes: class_rows.into_keys().collect(),
            log_priors,
            means,
            variances,
        });

        tracing::debug!(classes = n_classes, features = n_features, "Fitted naive Bayes");
        Ok(())
    }

    fn predict(&self, features: &ArrayView2<f64>) -> TrainResult<Array1<usize>> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| TrainError::ModelNotTrained(self.name().to_string()))?;
        validate_prediction_input(features, params.means.ncols())?;

        Ok(features
            .rows()
            .into_iter()
            .map(|row| params.classes[argmax(&Self::joint_log_likelihood(params, &row))])
            .collect())
    }

    fn is_trained(&self) -> bool {
        self.params.is_some()
    }
}
