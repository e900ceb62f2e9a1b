//! Disease prediction from binary symptom indicators.
//!
//! **Version**: 0.1.0
//!
//! This crate provides the full training and inference path for a symptom
//! table:
//! - CSV loading with categorical column encoding
//! - Label encoding of disease names
//! - Random oversampling to balance classes
//! - Stratified k-fold cross-validation with per-candidate failure isolation
//! - Kernel SVM, Gaussian naive Bayes, decision tree and random forest classifiers
//! - Plurality-vote ensembling with a deterministic tie-break
//! - Symptom-string inference producing per-model and combined predictions
//!
//! ```no_run
//! use symptomcheck_train::{
//!     CsvLoader, DiseasePredictor, ForestConfig, LabelEncoder, ModelEnsemble,
//!     NaiveBayesConfig, RandomOverSampler, SvmConfig, SymptomIndex,
//! };
//!
//! # fn main() -> symptomcheck_train::TrainResult<()> {
//! let dataset = CsvLoader::new().load("improved_disease_dataset.csv")?;
//! let mut encoder = LabelEncoder::new();
//! let labels = encoder.fit_transform(&dataset.labels)?;
//! let (x, y) = RandomOverSampler::new(42).fit_resample(&dataset.features, &labels)?;
//!
//! let mut ensemble = ModelEnsemble::standard(
//!     SvmConfig::default(),
//!     NaiveBayesConfig::default(),
//!     ForestConfig::default(),
//! );
//! ensemble.train(&x.view(), &y.view())?;
//!
//! let index = SymptomIndex::from_feature_names(&dataset.feature_names);
//! let record = DiseasePredictor::new(&encoder, &ensemble, &index)
//!     .predict_disease("Itching, Skin Rash, Nodal skin Eruptions")?;
//! println!("{}", record.final_prediction);
//! # Ok(())
//! # }
//! ```

mod crossval;
mod data;
mod encoding;
mod ensemble;
mod error;
mod forest;
mod inference;
mod kernel;
mod metrics;
mod model;
mod naive_bayes;
mod sampling;
mod svm;
mod tree;
mod vote;

#[cfg(feature = "structured-logging")]
pub mod structured_logging;

pub use error::{TrainError, TrainResult};

// Data loading and preprocessing
pub use data::{CsvLoader, Dataset};
pub use encoding::LabelEncoder;
pub use sampling::{class_counts, RandomOverSampler};

// Classifiers
pub use forest::{BaggingHelper, ForestConfig, RandomForestClassifier};
pub use kernel::{Gamma, Kernel, KernelKind, LinearKernel, RbfKernel};
pub use model::{Classifier, ClassifierFactory};
pub use naive_bayes::{GaussianNaiveBayes, NaiveBayesConfig};
pub use svm::{SvmClassifier, SvmConfig};
pub use tree::{DecisionTreeClassifier, MaxFeatures, TreeConfig};

// Cross-validation
pub use crossval::{
    Candidate, CandidateReport, CrossValidationResults, CrossValidationSplit, CrossValidator,
    StratifiedKFold,
};

// Ensembling and inference
pub use ensemble::{MemberPrediction, ModelEnsemble};
pub use inference::{DiseasePredictor, ModelPrediction, PredictionRecord, SymptomIndex, SymptomVector};
pub use vote::{combine, plurality};

// Metrics
pub use metrics::{accuracy, ConfusionMatrix};
