//! Configuration file support for the symptomcheck CLI
//!
//! Configuration is read from a `.symptomcheckrc` TOML file in:
//! - Current directory
//! - User home directory
//!
//! Every key is optional; missing keys take the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use symptomcheck_train::structured_logging::{LogFormat, LogLevel};
use symptomcheck_train::{
    Classifier, DecisionTreeClassifier, ForestConfig, GaussianNaiveBayes, NaiveBayesConfig,
    RandomForestClassifier, SvmClassifier, SvmConfig, TreeConfig,
};

/// Name of the configuration file.
pub const CONFIG_FILE: &str = ".symptomcheckrc";

/// Query run when none are configured.
pub const DEFAULT_QUERY: &str = "Itching, Skin Rash, Nodal skin Eruptions";

/// Configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input table settings
    pub dataset: DatasetConfig,

    /// Seed for oversampling and fold shuffling
    pub seed: u64,

    /// Cross-validation diagnostic
    pub cross_validation: CrossValidationConfig,

    /// Kernel SVM member
    pub svm: SvmConfig,

    /// Naive Bayes member
    pub naive_bayes: NaiveBayesConfig,

    /// Random forest member
    pub random_forest: ForestConfig,

    /// Decision tree cross-validation candidate
    pub decision_tree: TreeConfig,

    /// Symptom strings to predict after training
    pub queries: Vec<String>,

    /// Report settings
    pub output: OutputConfig,

    /// Log settings
    pub logging: LoggingConfig,
}

/// Input table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file to load
    pub path: PathBuf,

    /// Columns holding string categories
    pub categorical_columns: Vec<String>,

    /// Label column; the last column when unset
    pub label_column: Option<String>,
}

/// Cross-validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    /// Number of stratified folds
    pub folds: usize,

    /// Model families to evaluate, in report order
    pub candidates: Vec<CandidateKind>,
}

/// A model family that can be cross-validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// Single CART tree
    DecisionTree,
    /// Bagged trees
    RandomForest,
    /// Kernel SVM
    Svm,
    /// Gaussian naive Bayes
    NaiveBayes,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored human-readable report
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}

/// Report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format
    pub format: OutputFormat,

    /// Enable colored output
    pub colored: bool,

    /// Number of most frequent confusions listed per model
    pub top_confusions: usize,
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level written to stderr
    pub level: LogLevel,

    /// Line format
    pub format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            seed: 42,
            cross_validation: CrossValidationConfig::default(),
            svm: SvmConfig::default(),
            naive_bayes: NaiveBayesConfig::default(),
            random_forest: ForestConfig::default(),
            decision_tree: TreeConfig::default(),
            queries: vec![DEFAULT_QUERY.to_string()],
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("improved_disease_dataset.csv"),
            categorical_columns: vec!["gender".to_string()],
            label_column: None,
        }
    }
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            candidates: vec![CandidateKind::DecisionTree, CandidateKind::RandomForest],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            colored: true,
            top_confusions: 5,
        }
    }
}

/// Builds fresh, untrained classifiers for one candidate.
pub type BoxedFactory = Box<dyn Fn() -> Box<dyn Classifier> + Sync>;

impl CandidateKind {
    /// Display name, matching the member names used in prediction records.
    pub fn name(self) -> &'static str {
        match self {
            CandidateKind::DecisionTree => "Decision Tree",
            CandidateKind::RandomForest => "Random Forest",
            CandidateKind::Svm => "SVM",
            CandidateKind::NaiveBayes => "Naive Bayes",
        }
    }

    /// Factory using the model settings from `config`.
    pub fn factory(self, config: &Config) -> BoxedFactory {
        match self {
            CandidateKind::DecisionTree => {
                let tree = config.decision_tree.clone();
                Box::new(move || {
                    Box::new(DecisionTreeClassifier::new(tree.clone())) as Box<dyn Classifier>
                })
            }
            CandidateKind::RandomForest => {
                let forest = config.random_forest.clone();
                Box::new(move || {
                    Box::new(RandomForestClassifier::new(forest.clone())) as Box<dyn Classifier>
                })
            }
            CandidateKind::Svm => {
                let svm = config.svm.clone();
                Box::new(move || {
                    Box::new(SvmClassifier::new(svm.clone())) as Box<dyn Classifier>
                })
            }
            CandidateKind::NaiveBayes => {
                let nb = config.naive_bayes.clone();
                Box::new(move || {
                    Box::new(GaussianNaiveBayes::new(nb.clone())) as Box<dyn Classifier>
                })
            }
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find and load the configuration file
    ///
    /// Search order:
    /// 1. .symptomcheckrc in current directory
    /// 2. .symptomcheckrc in user home directory
    ///
    /// Falls back to defaults when neither exists. A file that exists but
    /// cannot be parsed is an error.
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// First existing configuration file, if any.
    pub fn find() -> Option<PathBuf> {
        let current = PathBuf::from(CONFIG_FILE);
        if current.exists() {
            return Some(current);
        }

        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE))
            .filter(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use symptomcheck_train::{Gamma, KernelKind};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.cross_validation.folds, 5);
        assert_eq!(
            config.cross_validation.candidates,
            vec![CandidateKind::DecisionTree, CandidateKind::RandomForest]
        );
        assert_eq!(config.queries, vec![DEFAULT_QUERY.to_string()]);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            seed = 7
            queries = ["Cough", "Fever, Chills"]

            [svm]
            c = 10.0
            kernel = { rbf = { gamma = { value = 0.05 } } }

            [output]
            format = "json"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.queries.len(), 2);
        assert_eq!(config.svm.c, 10.0);
        assert_eq!(
            config.svm.kernel,
            KernelKind::Rbf {
                gamma: Gamma::Value(0.05)
            }
        );
        assert_eq!(config.svm.tol, SvmConfig::default().tol);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.colored);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.random_forest.n_estimators, 100);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed = \"not a number\"").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_candidate_factories() {
        let config = Config::default();
        for kind in [
            CandidateKind::DecisionTree,
            CandidateKind::RandomForest,
            CandidateKind::Svm,
            CandidateKind::NaiveBayes,
        ] {
            let model = kind.factory(&config)();
            assert_eq!(model.name(), kind.name());
            assert!(!model.is_trained());
        }
    }
}
