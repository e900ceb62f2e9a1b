//! Heterogeneous classifier ensemble with hard plurality voting.

use crate::forest::{ForestConfig, RandomForestClassifier};
use crate::model::Classifier;
use crate::naive_bayes::{GaussianNaiveBayes, NaiveBayesConfig};
use crate::svm::{SvmClassifier, SvmConfig};
use crate::vote::combine;
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{Array1, ArrayView1, ArrayView2};

/// Predictions of one member over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPrediction {
    /// Member name.
    pub model: String,
    /// One class code per input row.
    pub predictions: Array1<usize>,
}

/// Independently trained classifiers combined by plurality vote.
///
/// Members are kept in insertion order; that order is the order of
/// [`ModelEnsemble::predict_each`] and of prediction records built on top.
pub struct ModelEnsemble {
    members: Vec<Box<dyn Classifier>>,
}

impl std::fmt::Debug for ModelEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEnsemble")
            .field("members", &self.member_names())
            .finish()
    }
}

impl ModelEnsemble {
    /// Create an ensemble from untrained members.
    pub fn new(members: Vec<Box<dyn Classifier>>) -> TrainResult<Self> {
        if members.is_empty() {
            return Err(TrainError::InvalidParameter(
                "Ensemble must have at least one member".to_string(),
            ));
        }
        Ok(Self { members })
    }

    /// SVM, naive Bayes and random forest, in that order.
    pub fn standard(svm: SvmConfig, naive_bayes: NaiveBayesConfig, forest: ForestConfig) -> Self {
        Self {
            members: vec![
                Box::new(SvmClassifier::new(svm)),
                Box::new(GaussianNaiveBayes::new(naive_bayes)),
                Box::new(RandomForestClassifier::new(forest)),
            ],
        }
    }

    /// Members in insertion order.
    pub fn members(&self) -> &[Box<dyn Classifier>] {
        &self.members
    }

    /// Member names in insertion order.
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the ensemble has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether every member has been trained.
    pub fn is_trained(&self) -> bool {
        self.members.iter().all(|m| m.is_trained())
    }

    /// Train every member on the same table.
    pub fn train(
        &mut self,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> TrainResult<()> {
        for member in &mut self.members {
            tracing::info!(model = member.name(), rows = features.nrows(), "Training");
            member
                .train(features, labels)
                .map_err(|e| TrainError::training_failure(member.name(), e))?;
        }
        Ok(())
    }

    /// Predictions of every member, in member order.
    pub fn predict_each(&self, features: &ArrayView2<f64>) -> TrainResult<Vec<MemberPrediction>> {
        self.members
            .iter()
            .map(|member| {
                Ok(MemberPrediction {
                    model: member.name().to_string(),
                    predictions: member.predict(features)?,
                })
            })
            .collect()
    }

    /// Row-wise plurality vote over member predictions.
    pub fn predict(&self, features: &ArrayView2<f64>) -> TrainResult<Array1<usize>> {
        let each = self.predict_each(features)?;
        Self::combine_rows(&each, features.nrows())
    }

    /// Combine per-member predictions already computed by [`Self::predict_each`].
    pub fn combine_rows(each: &[MemberPrediction], n_rows: usize) -> TrainResult<Array1<usize>> {
        (0..n_rows)
            .map(|i| {
                let votes: Vec<usize> = each.iter().map(|m| m.predictions[i]).collect();
                combine(&votes)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray::{array, Array2};

    /// Always predicts a fixed code once trained.
    struct Constant {
        name: &'static str,
        code: usize,
        trained: bool,
    }

    impl Constant {
        fn boxed(name: &'static str, code: usize) -> Box<dyn Classifier> {
            Box::new(Self {
                name,
                code,
                trained: false,
            })
        }
    }

    impl Classifier for Constant {
        fn name(&self) -> &str {
            self.name
        }

        fn train(&mut self, _: &ArrayView2<f64>, _: &ArrayView1<usize>) -> TrainResult<()> {
            self.trained = true;
            Ok(())
        }

        fn predict(&self, features: &ArrayView2<f64>) -> TrainResult<Array1<usize>> {
            if !self.trained {
                return Err(TrainError::ModelNotTrained(self.name.to_string()));
            }
            Ok(Array1::from_elem(features.nrows(), self.code))
        }

        fn is_trained(&self) -> bool {
            self.trained
        }
    }

    #[test]
    fn test_standard_member_order() {
        let ensemble = ModelEnsemble::standard(
            SvmConfig::default(),
            NaiveBayesConfig::default(),
            ForestConfig::default(),
        );
        assert_eq!(
            ensemble.member_names(),
            vec!["SVM", "Naive Bayes", "Random Forest"]
        );
        assert!(!ensemble.is_trained());
    }

    #[test]
    fn test_majority_and_tie() {
        let x = Array2::zeros((2, 1));
        let y = array![0, 0];

        let mut majority = ModelEnsemble::new(vec![
            Constant::boxed("a", 1),
            Constant::boxed("b", 2),
            Constant::boxed("c", 2),
        ])
        .unwrap();
        majority.train(&x.view(), &y.view()).unwrap();
        assert_eq!(majority.predict(&x.view()).unwrap(), array![2, 2]);

        let mut tied = ModelEnsemble::new(vec![
            Constant::boxed("a", 5),
            Constant::boxed("b", 3),
            Constant::boxed("c", 4),
        ])
        .unwrap();
        tied.train(&x.view(), &y.view()).unwrap();
        assert_eq!(tied.predict(&x.view()).unwrap(), array![3, 3]);
    }

    #[test]
    fn test_predict_each_keeps_member_order() {
        let x = Array2::zeros((1, 1));
        let mut ensemble =
            ModelEnsemble::new(vec![Constant::boxed("first", 0), Constant::boxed("second", 1)])
                .unwrap();
        ensemble.train(&x.view(), &array![0].view()).unwrap();

        let each = ensemble.predict_each(&x.view()).unwrap();
        assert_eq!(each[0].model, "first");
        assert_eq!(each[1].predictions, array![1]);
    }

    #[test]
    fn test_untrained_member_fails_prediction() {
        let ensemble = ModelEnsemble::new(vec![Constant::boxed("a", 0)]).unwrap();
        assert!(matches!(
            ensemble.predict(&Array2::zeros((1, 1)).view()),
            Err(TrainError::ModelNotTrained(_))
        ));
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        assert!(ModelEnsemble::new(Vec::new()).is_err());
    }
}
