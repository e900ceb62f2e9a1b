//! End-to-end run: load, balance, cross-validate, train, predict.

use anyhow::{Context, Result};
use scirs2_core::ndarray::Array1;
use std::collections::BTreeMap;
use symptomcheck_train::{
    accuracy, class_counts, Candidate, CandidateReport, ConfusionMatrix, CrossValidator,
    CsvLoader, Dataset, DiseasePredictor, LabelEncoder, ModelEnsemble, PredictionRecord,
    RandomOverSampler, SymptomIndex, TrainResult,
};

use crate::config::{BoxedFactory, Config};

/// Training-set accuracy of one model or of the combined vote.
#[derive(Debug, Clone)]
pub struct ModelAccuracy {
    /// Member name, or "Combined".
    pub model: String,
    /// Fraction of resampled rows predicted correctly.
    pub accuracy: f64,
    /// Confusion over the resampled rows.
    pub confusion: ConfusionMatrix,
}

/// Everything the report printer needs.
#[derive(Debug)]
pub struct PipelineReport {
    /// Disease names, indexed by class code.
    pub classes: Vec<String>,
    /// Rows per disease as loaded.
    pub distribution_before: BTreeMap<String, usize>,
    /// Rows per disease after oversampling.
    pub distribution_after: BTreeMap<String, usize>,
    /// One entry per configured candidate, in configuration order.
    pub cross_validation: Vec<CandidateReport>,
    /// Per-member accuracy on the resampled table, in member order.
    pub training_accuracy: Vec<ModelAccuracy>,
    /// Accuracy of the plurality vote on the resampled table.
    pub combined_accuracy: ModelAccuracy,
    /// Each configured query with its prediction record.
    pub predictions: Vec<(String, PredictionRecord)>,
}

/// Load the configured dataset and run the pipeline on it.
pub fn run(config: &Config) -> Result<PipelineReport> {
    let mut loader =
        CsvLoader::new().with_categorical_columns(config.dataset.categorical_columns.clone());
    if let Some(label) = &config.dataset.label_column {
        loader = loader.with_label_column(label.clone());
    }

    let dataset = loader
        .load(&config.dataset.path)
        .with_context(|| format!("Failed to load dataset {}", config.dataset.path.display()))?;
    tracing::info!(
        rows = dataset.num_samples(),
        features = dataset.num_features(),
        "Dataset loaded"
    );

    run_on_dataset(config, &dataset)
}

/// Run the pipeline on an already loaded table.
pub fn run_on_dataset(config: &Config, dataset: &Dataset) -> Result<PipelineReport> {
    let mut encoder = LabelEncoder::new();
    let labels = encoder
        .fit_transform(&dataset.labels)
        .context("Failed to encode disease labels")?;
    let distribution_before = dataset.class_distribution();

    let (x, y) = RandomOverSampler::new(config.seed)
        .fit_resample(&dataset.features, &labels)
        .context("Failed to balance classes")?;
    let distribution_after = class_counts(&y)
        .into_iter()
        .map(|(code, count)| encoder.decode(code).map(|name| (name.to_string(), count)))
        .collect::<TrainResult<BTreeMap<_, _>>>()?;
    tracing::info!(rows = x.nrows(), "Classes balanced");

    let validator = CrossValidator::stratified(config.cross_validation.folds, config.seed)
        .context("Invalid cross-validation settings")?;
    let factories: Vec<(&'static str, BoxedFactory)> = config
        .cross_validation
        .candidates
        .iter()
        .map(|kind| (kind.name(), kind.factory(config)))
        .collect();
    let candidates: Vec<Candidate<'_>> = factories
        .iter()
        .map(|(name, factory)| Candidate {
            name: *name,
            factory: factory.as_ref(),
        })
        .collect();
    let cross_validation = validator.evaluate_all(&candidates, &x.view(), &y.view());

    let mut ensemble = ModelEnsemble::standard(
        config.svm.clone(),
        config.naive_bayes.clone(),
        config.random_forest.clone(),
    );
    ensemble
        .train(&x.view(), &y.view())
        .context("Failed to train ensemble")?;

    let num_classes = encoder.num_classes();
    let score = |model: &str, predictions: &Array1<usize>| -> Result<ModelAccuracy> {
        Ok(ModelAccuracy {
            model: model.to_string(),
            accuracy: accuracy(&y.view(), &predictions.view())?,
            confusion: ConfusionMatrix::from_labels(&y.view(), &predictions.view(), num_classes)?,
        })
    };

    let each = ensemble.predict_each(&x.view())?;
    let training_accuracy = each
        .iter()
        .map(|member| score(&member.model, &member.predictions))
        .collect::<Result<Vec<_>>>()?;
    let combined = ModelEnsemble::combine_rows(&each, x.nrows())?;
    let combined_accuracy = score("Combined", &combined)?;

    let index = SymptomIndex::from_feature_names(&dataset.feature_names);
    let predictor = DiseasePredictor::new(&encoder, &ensemble, &index);
    let predictions = config
        .queries
        .iter()
        .map(|query| {
            predictor
                .predict_disease(query)
                .map(|record| (query.clone(), record))
                .with_context(|| format!("Prediction failed for '{}'", query))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PipelineReport {
        classes: encoder.classes().to_vec(),
        distribution_before,
        distribution_after,
        cross_validation,
        training_accuracy,
        combined_accuracy,
        predictions,
    })
}
