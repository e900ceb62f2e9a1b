//! Classification metrics over integer class codes.

use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::ArrayView1;

fn check_lengths(y_true: &ArrayView1<usize>, y_pred: &ArrayView1<usize>) -> TrainResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(TrainError::MetricsError(format!(
            "Length mismatch: {} targets vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(TrainError::EmptyInput("no predictions to score".to_string()));
    }
    Ok(())
}

/// Fraction of predictions equal to the target.
pub fn accuracy(y_true: &ArrayView1<usize>, y_pred: &ArrayView1<usize>) -> TrainResult<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Confusion matrix (rows = true class, columns = predicted class).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Create an empty matrix.
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            matrix: vec![vec![0; num_classes]; num_classes],
        }
    }

    /// Tally predictions against targets.
    ///
    /// Every code must be below `num_classes`.
    pub fn from_labels(
        y_true: &ArrayView1<usize>,
        y_pred: &ArrayView1<usize>,
        num_classes: usize,
    ) -> TrainResult<Self> {
        check_lengths(y_true, y_pred)?;
        let mut cm = Self::new(num_classes);
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            let out_of_range = t.max(p);
            if out_of_range >= num_classes {
                return Err(TrainError::IndexOutOfRange {
                    index: out_of_range,
                    num_classes,
                });
            }
            cm.matrix[t][p] += 1;
        }
        Ok(cm)
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Get the confusion matrix.
    pub fn matrix(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Get value at (true_class, pred_class).
    pub fn get(&self, true_class: usize, pred_class: usize) -> usize {
        self.matrix[true_class][pred_class]
    }

    /// Total number of tallied rows.
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Number of correctly predicted rows.
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|k| self.matrix[k][k]).sum()
    }

    /// Number of rows off the diagonal.
    pub fn misclassified(&self) -> usize {
        self.total() - self.correct()
    }

    /// Per-class precision; 0 for classes never predicted.
    pub fn precision_per_class(&self) -> Vec<f64> {
        (0..self.num_classes)
            .map(|pred_class| {
                let predicted: usize = self.matrix.iter().map(|row| row[pred_class]).sum();
                if predicted == 0 {
                    0.0
                } else {
                    self.matrix[pred_class][pred_class] as f64 / predicted as f64
                }
            })
            .collect()
    }

    /// Per-class recall; 0 for classes absent from the targets.
    pub fn recall_per_class(&self) -> Vec<f64> {
        self.matrix
            .iter()
            .enumerate()
            .map(|(true_class, row)| {
                let actual: usize = row.iter().sum();
                if actual == 0 {
                    0.0
                } else {
                    row[true_class] as f64 / actual as f64
                }
            })
            .collect()
    }

    /// Off-diagonal cells as `(true_class, pred_class, count)`, largest first.
    pub fn top_confusions(&self, limit: usize) -> Vec<(usize, usize, usize)> {
        let mut cells: Vec<(usize, usize, usize)> = self
            .matrix
            .iter()
            .enumerate()
            .flat_map(|(t, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |&(p, &count)| p != t && count > 0)
                    .map(move |(p, &count)| (t, p, count))
            })
            .collect();
        cells.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));
        cells.truncate(limit);
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use scirs2_core::ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![0, 1, 2, 1];
        let y_pred = array![0, 1, 1, 1];
        assert_abs_diff_eq!(accuracy(&y_true.view(), &y_pred.view()).unwrap(), 0.75);
    }

    #[test]
    fn test_accuracy_errors() {
        let a = array![0, 1];
        let b = array![0];
        assert!(matches!(
            accuracy(&a.view(), &b.view()),
            Err(TrainError::MetricsError(_))
        ));

        let empty = scirs2_core::ndarray::Array1::<usize>::zeros(0);
        assert!(matches!(
            accuracy(&empty.view(), &empty.view()),
            Err(TrainError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_confusion_matrix() {
        let y_true = array![0, 0, 1, 1, 2];
        let y_pred = array![0, 1, 1, 1, 0];
        let cm = ConfusionMatrix::from_labels(&y_true.view(), &y_pred.view(), 3).unwrap();

        assert_eq!(cm.get(0, 0), 1);
        assert_eq!(cm.get(0, 1), 1);
        assert_eq!(cm.get(2, 0), 1);
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.correct(), 3);
        assert_eq!(cm.misclassified(), 2);

        let precision = cm.precision_per_class();
        assert_abs_diff_eq!(precision[0], 0.5);
        assert_abs_diff_eq!(precision[1], 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(precision[2], 0.0);

        let recall = cm.recall_per_class();
        assert_abs_diff_eq!(recall[0], 0.5);
        assert_abs_diff_eq!(recall[1], 1.0);
        assert_abs_diff_eq!(recall[2], 0.0);
    }

    #[test]
    fn test_top_confusions() {
        let y_true = array![0, 0, 0, 1, 2];
        let y_pred = array![1, 1, 0, 2, 2];
        let cm = ConfusionMatrix::from_labels(&y_true.view(), &y_pred.view(), 3).unwrap();

        assert_eq!(cm.top_confusions(5), vec![(0, 1, 2), (1, 2, 1)]);
        assert_eq!(cm.top_confusions(1), vec![(0, 1, 2)]);
    }

    #[test]
    fn test_code_out_of_range() {
        let y_true = array![0, 3];
        let y_pred = array![0, 0];
        assert!(matches!(
            ConfusionMatrix::from_labels(&y_true.view(), &y_pred.view(), 3),
            Err(TrainError::IndexOutOfRange { index: 3, .. })
        ));
    }
}
