//! Data loading for symptom tables.
//!
//! A symptom table is a delimited text file with a header row. Every column
//! except the label column holds a 0/1 symptom indicator, apart from a few
//! designated categorical columns (for example `gender`) whose string values
//! are label-encoded per column at load time. Empty cells load as `0.0`.

use crate::encoding::LabelEncoder;
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::Array2;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Symptom feature table with one disease label per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix (samples x features).
    pub features: Array2<f64>,
    /// Feature names in column order.
    pub feature_names: Vec<String>,
    /// Disease label for each row.
    pub labels: Vec<String>,
}

impl Dataset {
    /// Create a new dataset, checking that every part agrees on its shape.
    pub fn new(
        features: Array2<f64>,
        feature_names: Vec<String>,
        labels: Vec<String>,
    ) -> TrainResult<Self> {
        if features.nrows() != labels.len() {
            return Err(TrainError::LabelFeatureSizeMismatch {
                features: features.nrows(),
                labels: labels.len(),
            });
        }
        if features.ncols() != feature_names.len() {
            return Err(TrainError::DatasetError(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                features.ncols()
            )));
        }
        Ok(Self {
            features,
            feature_names,
            labels,
        })
    }

    /// Get number of samples.
    pub fn num_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Get number of features.
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// Row count per label, ordered by label.
    pub fn class_distribution(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Get a subset of the dataset by indices.
    pub fn subset(&self, indices: &[usize]) -> TrainResult<Dataset> {
        let n = self.num_samples();
        if let Some(&idx) = indices.iter().find(|&&idx| idx >= n) {
            return Err(TrainError::InvalidParameter(format!(
                "Index {} out of bounds for dataset with {} samples",
                idx, n
            )));
        }

        let features = Array2::from_shape_fn((indices.len(), self.num_features()), |(i, j)| {
            self.features[[indices[i], j]]
        });
        let labels = indices.iter().map(|&i| self.labels[i].clone()).collect();

        Ok(Dataset {
            features,
            feature_names: self.feature_names.clone(),
            labels,
        })
    }
}

/// CSV data loader.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    /// Delimiter character.
    pub delimiter: char,
    /// Name of the label column; the last column when `None`.
    pub label_column: Option<String>,
    /// Columns holding string categories instead of 0/1 indicators.
    pub categorical_columns: Vec<String>,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            delimiter: ',',
            label_column: None,
            categorical_columns: vec!["gender".to_string()],
        }
    }
}

impl CsvLoader {
    /// Create a new CSV loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter character.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Use a named column as the label instead of the last one.
    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = Some(name.into());
        self
    }

    /// Set the categorical column names.
    pub fn with_categorical_columns(mut self, columns: Vec<String>) -> Self {
        self.categorical_columns = columns;
        self
    }

    /// Load data from a CSV file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> TrainResult<Dataset> {
        let file = File::open(path.as_ref()).map_err(|e| {
            TrainError::DatasetError(format!(
                "Failed to open CSV file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        self.load_from_reader(file)
    }

    /// Load data from any reader producing CSV text.
    pub fn load_from_reader<R: Read>(&self, reader: R) -> TrainResult<Dataset> {
        let mut lines = BufReader::new(reader).lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(TrainError::EmptyInput("CSV file has no header".to_string())),
        };
        let names: Vec<String> = header
            .split(self.delimiter)
            .map(|s| unquote(s).to_string())
            .collect();

        if names.len() < 2 {
            return Err(TrainError::DatasetError(
                "CSV needs at least one feature column and a label column".to_string(),
            ));
        }

        let label_idx = match &self.label_column {
            Some(name) => names.iter().position(|n| n == name).ok_or_else(|| {
                TrainError::DatasetError(format!("Label column '{}' not in header", name))
            })?,
            None => names.len() - 1,
        };

        let feature_cols: Vec<usize> = (0..names.len()).filter(|&i| i != label_idx).collect();
        let feature_names: Vec<String> = feature_cols.iter().map(|&i| names[i].clone()).collect();
        let categorical: Vec<bool> = feature_names
            .iter()
            .map(|name| self.categorical_columns.contains(name))
            .collect();

        // Raw cells are kept until every categorical vocabulary is known.
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut line_numbers = Vec::new();
        let mut labels = Vec::new();

        for (line_no, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            let values: Vec<&str> = line.split(self.delimiter).map(unquote).collect();
            if values.len() != names.len() {
                return Err(TrainError::DatasetError(format!(
                    "Line {}: expected {} fields, got {}",
                    line_no + 2,
                    names.len(),
                    values.len()
                )));
            }

            line_numbers.push(line_no + 2);
            labels.push(values[label_idx].to_string());
            rows.push(feature_cols.iter().map(|&i| values[i].to_string()).collect());
        }

        if rows.is_empty() {
            return Err(TrainError::EmptyInput("CSV file has no data rows".to_string()));
        }

        let encoders: Vec<Option<LabelEncoder>> = categorical
            .iter()
            .enumerate()
            .map(|(j, &is_cat)| {
                is_cat.then(|| {
                    let column: Vec<&str> = rows
                        .iter()
                        .map(|row| row[j].as_str())
                        .filter(|v| !v.is_empty())
                        .collect();
                    let mut encoder = LabelEncoder::new();
                    encoder.fit(&column);
                    encoder
                })
            })
            .collect();

        let mut features = Array2::zeros((rows.len(), feature_names.len()));
        for (i, row) in rows.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                features[[i, j]] = match &encoders[j] {
                    Some(encoder) => encoder.encode(cell)? as f64,
                    None => parse_cell(cell).map_err(|reason| {
                        TrainError::DatasetError(format!(
                            "Line {}, column '{}': {}",
                            line_numbers[i], feature_names[j], reason
                        ))
                    })?,
                };
            }
        }

        Dataset::new(features, feature_names, labels)
    }
}

/// Trim whitespace and one pair of surrounding double quotes.
fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .map_or(field, str::trim)
}

/// Parse a numeric cell. NaN counts as missing; infinities are rejected.
fn parse_cell(cell: &str) -> Result<f64, String> {
    let value = cell
        .parse::<f64>()
        .map_err(|e| format!("failed to parse '{}': {}", cell, e))?;
    if value.is_nan() {
        Ok(0.0)
    } else if value.is_infinite() {
        Err(format!("non-finite value '{}'", cell))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
itching,skin_rash,gender,disease
1,1,Female,Fungal infection
0,1,Male,Allergy

1,0,,Fungal infection
";

    #[test]
    fn test_load_from_reader() {
        let dataset = CsvLoader::new().load_from_reader(TABLE.as_bytes()).unwrap();

        assert_eq!(dataset.num_samples(), 3);
        assert_eq!(dataset.num_features(), 3);
        assert_eq!(dataset.feature_names, vec!["itching", "skin_rash", "gender"]);
        assert_eq!(dataset.labels[1], "Allergy");
        // Female=0, Male=1, missing=0
        assert_eq!(dataset.features[[0, 2]], 0.0);
        assert_eq!(dataset.features[[1, 2]], 1.0);
        assert_eq!(dataset.features[[2, 2]], 0.0);
        assert_eq!(dataset.features[[2, 0]], 1.0);
    }

    #[test]
    fn test_named_label_column() {
        let csv = "disease,fever,cough\nFlu,1,1\nCold,0,1\n";
        let dataset = CsvLoader::new()
            .with_label_column("disease")
            .load_from_reader(csv.as_bytes())
            .unwrap();

        assert_eq!(dataset.feature_names, vec!["fever", "cough"]);
        assert_eq!(dataset.labels, vec!["Flu", "Cold"]);
    }

    #[test]
    fn test_non_numeric_feature_is_rejected() {
        let csv = "fever,disease\nyes,Flu\n";
        let err = CsvLoader::new().load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TrainError::DatasetError(_)));
    }

    #[test]
    fn test_nan_cells_become_zero() {
        let csv = "fever,cough,disease\nnan,1,Flu\n1,NaN,Cold\n";
        let dataset = CsvLoader::new().load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.features[[0, 0]], 0.0);
        assert_eq!(dataset.features[[1, 1]], 0.0);
        assert!(dataset.features.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_infinite_cells_are_rejected() {
        for cell in ["inf", "-inf", "infinity"] {
            let csv = format!("fever,disease\n0,Flu\n{},Cold\n", cell);
            let err = CsvLoader::new().load_from_reader(csv.as_bytes()).unwrap_err();
            assert!(matches!(err, TrainError::DatasetError(_)), "{}", cell);
            assert!(err.to_string().contains("Line 3"));
        }
    }

    #[test]
    fn test_quoted_fields_are_unquoted() {
        let csv = "\"itching\", \"skin rash\",\"disease\"\n1,\"0\",\"Fungal infection\"\n";
        let dataset = CsvLoader::new().load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.feature_names, vec!["itching", "skin rash"]);
        assert_eq!(dataset.labels, vec!["Fungal infection"]);
        assert_eq!(dataset.features[[0, 1]], 0.0);
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let csv = "fever,cough,disease\n1,Flu\n";
        let err = CsvLoader::new().load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected 3 fields"));
    }

    #[test]
    fn test_header_only_is_empty_input() {
        let csv = "fever,disease\n";
        let err = CsvLoader::new().load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TrainError::EmptyInput(_)));
    }

    #[test]
    fn test_class_distribution_and_subset() {
        let dataset = CsvLoader::new().load_from_reader(TABLE.as_bytes()).unwrap();

        let dist = dataset.class_distribution();
        assert_eq!(dist["Fungal infection"], 2);
        assert_eq!(dist["Allergy"], 1);

        let subset = dataset.subset(&[1]).unwrap();
        assert_eq!(subset.num_samples(), 1);
        assert_eq!(subset.labels, vec!["Allergy"]);
        assert!(dataset.subset(&[5]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symptoms.csv");
        std::fs::write(&path, TABLE).unwrap();

        let dataset = CsvLoader::new().load(&path).unwrap();
        assert_eq!(dataset.num_samples(), 3);
        assert!(CsvLoader::new().load(dir.path().join("missing.csv")).is_err());
    }
}
