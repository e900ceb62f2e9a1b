//! Symptom-string inference.
//!
//! A free-text query such as `"Itching, Skin Rash"` is turned into a 0/1
//! feature row using the column order of the training table, fed to every
//! ensemble member, and the decoded disease names are combined by plurality
//! vote.

use crate::encoding::LabelEncoder;
use crate::ensemble::ModelEnsemble;
use crate::vote::plurality;
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{Array1, Axis};
use serde::Serialize;
use std::collections::HashMap;

/// Symptom name to feature position, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct SymptomIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

/// A vectorized query.
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomVector {
    /// One value per feature column; 1.0 where a symptom was named.
    pub values: Array1<f64>,
    /// Tokens that matched a column, in query order.
    pub recognized: Vec<String>,
    /// Tokens that matched nothing, in query order.
    pub unrecognized: Vec<String>,
}

impl SymptomIndex {
    /// Build the index from feature column names.
    ///
    /// A name repeated in the header maps to its first position.
    pub fn from_feature_names<S: AsRef<str>>(names: &[S]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(i);
        }
        Self { names, positions }
    }

    /// Position of a symptom column.
    pub fn get(&self, symptom: &str) -> Option<usize> {
        self.positions.get(symptom).copied()
    }

    /// Number of feature columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index has no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column names in feature order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Vectorize a comma-separated symptom list.
    ///
    /// Tokens are trimmed and matched exactly. Empty tokens are skipped and
    /// unknown ones are ignored.
    pub fn vectorize(&self, input: &str) -> SymptomVector {
        let mut values = Array1::zeros(self.len());
        let mut recognized = Vec::new();
        let mut unrecognized = Vec::new();

        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match self.get(token) {
                Some(pos) => {
                    values[pos] = 1.0;
                    recognized.push(token.to_string());
                }
                None => unrecognized.push(token.to_string()),
            }
        }

        SymptomVector {
            values,
            recognized,
            unrecognized,
        }
    }
}

/// One member's decoded prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelPrediction {
    /// Member name.
    pub model: String,
    /// Decoded disease name.
    pub disease: String,
}

/// Per-model predictions plus the combined result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRecord {
    /// One entry per ensemble member, in member order.
    pub predictions: Vec<ModelPrediction>,
    /// Plurality vote over `predictions`.
    pub final_prediction: String,
}

impl PredictionRecord {
    /// Prediction of the member called `model`.
    pub fn get(&self, model: &str) -> Option<&str> {
        self.predictions
            .iter()
            .find(|p| p.model == model)
            .map(|p| p.disease.as_str())
    }
}

/// Predicts diseases from symptom strings using borrowed collaborators.
#[derive(Debug, Clone, Copy)]
pub struct DiseasePredictor<'a> {
    encoder: &'a LabelEncoder,
    ensemble: &'a ModelEnsemble,
    index: &'a SymptomIndex,
}

impl<'a> DiseasePredictor<'a> {
    /// Wire up a predictor.
    pub fn new(
        encoder: &'a LabelEncoder,
        ensemble: &'a ModelEnsemble,
        index: &'a SymptomIndex,
    ) -> Self {
        Self {
            encoder,
            ensemble,
            index,
        }
    }

    /// Predict the disease for a comma-separated symptom list.
    ///
    /// A query with no recognized symptom still yields a full record built
    /// from the all-zero row.
    pub fn predict_disease(&self, input: &str) -> TrainResult<PredictionRecord> {
        if let Some(untrained) = self.ensemble.members().iter().find(|m| !m.is_trained()) {
            return Err(TrainError::ModelNotTrained(untrained.name().to_string()));
        }

        let vector = self.index.vectorize(input);
        if !vector.unrecognized.is_empty() {
            tracing::debug!(ignored = ?vector.unrecognized, "Ignoring unknown symptoms");
        }

        let row = vector.values.insert_axis(Axis(0));
        let predictions = self
            .ensemble
            .members()
            .iter()
            .map(|member| {
                let code = member.predict_row(&row.row(0))?;
                Ok(ModelPrediction {
                    model: member.name().to_string(),
                    disease: self.encoder.decode(code)?.to_string(),
                })
            })
            .collect::<TrainResult<Vec<_>>>()?;

        let names: Vec<&str> = predictions.iter().map(|p| p.disease.as_str()).collect();
        let final_prediction = plurality(&names)?.to_string();

        Ok(PredictionRecord {
            predictions,
            final_prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestConfig;
    use crate::naive_bayes::NaiveBayesConfig;
    use crate::svm::SvmConfig;
    use scirs2_core::ndarray::{Array1, Array2};

    fn index() -> SymptomIndex {
        SymptomIndex::from_feature_names(&["Itching", "Skin Rash", "Cough"])
    }

    #[test]
    fn test_vectorize_trims_and_ignores_unknown() {
        let v = index().vectorize(" Itching ,Nonsense,Cough");
        assert_eq!(v.values.to_vec(), vec![1.0, 0.0, 1.0]);
        assert_eq!(v.recognized, vec!["Itching", "Cough"]);
        assert_eq!(v.unrecognized, vec!["Nonsense"]);
    }

    #[test]
    fn test_vectorize_is_case_sensitive() {
        let v = index().vectorize("itching");
        assert_eq!(v.values.sum(), 0.0);
        assert!(v.recognized.is_empty());
    }

    #[test]
    fn test_vectorize_empty_input() {
        let v = index().vectorize("");
        assert_eq!(v.values.len(), 3);
        assert!(v.recognized.is_empty() && v.unrecognized.is_empty());
    }

    #[test]
    fn test_index_lookup() {
        let idx = index();
        assert_eq!(idx.get("Skin Rash"), Some(1));
        assert_eq!(idx.get("Fever"), None);
        assert_eq!(idx.len(), 3);
    }

    fn trained_predictor_parts() -> (LabelEncoder, ModelEnsemble, SymptomIndex) {
        let diseases = ["Acne", "Flu", "Psoriasis"];
        let x = Array2::from_shape_fn((30, 3), |(i, j)| if i % 3 == j { 1.0 } else { 0.0 });
        let names: Vec<&str> = (0..30).map(|i| diseases[i % 3]).collect();

        let mut encoder = LabelEncoder::new();
        let y: Array1<usize> = encoder.fit_transform(&names).unwrap();

        let mut ensemble = ModelEnsemble::standard(
            SvmConfig::default(),
            NaiveBayesConfig::default(),
            ForestConfig {
                n_estimators: 10,
                ..ForestConfig::default()
            },
        );
        ensemble.train(&x.view(), &y.view()).unwrap();

        let index = SymptomIndex::from_feature_names(&["Blackheads", "Fever", "Scaly Skin"]);
        (encoder, ensemble, index)
    }

    #[test]
    fn test_predict_disease_record() {
        let (encoder, ensemble, index) = trained_predictor_parts();
        let predictor = DiseasePredictor::new(&encoder, &ensemble, &index);

        let record = predictor.predict_disease("Fever").unwrap();
        assert_eq!(record.predictions.len(), 3);
        assert_eq!(record.get("Naive Bayes"), Some("Flu"));
        assert_eq!(record.final_prediction, "Flu");
    }

    #[test]
    fn test_predict_disease_without_known_symptoms() {
        let (encoder, ensemble, index) = trained_predictor_parts();
        let predictor = DiseasePredictor::new(&encoder, &ensemble, &index);

        let record = predictor.predict_disease("Nothing, At All").unwrap();
        assert_eq!(record.predictions.len(), 3);
        assert!(["Acne", "Flu", "Psoriasis"].contains(&record.final_prediction.as_str()));
    }

    #[test]
    fn test_untrained_ensemble() {
        let encoder = LabelEncoder::new();
        let ensemble = ModelEnsemble::standard(
            SvmConfig::default(),
            NaiveBayesConfig::default(),
            ForestConfig::default(),
        );
        let index = index();
        let predictor = DiseasePredictor::new(&encoder, &ensemble, &index);

        assert!(matches!(
            predictor.predict_disease("Itching"),
            Err(TrainError::ModelNotTrained(name)) if name == "SVM"
        ));
    }

    #[test]
    fn test_record_serializes() {
        let record = PredictionRecord {
            predictions: vec![ModelPrediction {
                model: "SVM".to_string(),
                disease: "Flu".to_string(),
            }],
            final_prediction: "Flu".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["final_prediction"], "Flu");
        assert_eq!(json["predictions"][0]["model"], "SVM");
    }
}
