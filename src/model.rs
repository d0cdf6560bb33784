use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, ClassifierKind};
use crate::logistic_regression::LogisticRegression;
use crate::parse::Diagnosis;
use crate::random_forest::RandomForest;

pub trait Normalizer {
    fn fit(features: ArrayView2<f64>) -> Self
    where
        Self: Sized;

    fn transform_row(&self, row: ArrayView1<f64>) -> Vec<f64>;

    fn transform(&self, features: ArrayView2<f64>) -> Array2<f64> {
        let mut transformed = features.to_owned();
        for (mut target, source) in transformed.rows_mut().into_iter().zip(features.rows()) {
            for (value, scaled) in target.iter_mut().zip(self.transform_row(source)) {
                *value = scaled;
            }
        }
        transformed
    }
}

pub trait Classifier {
    fn fit(&mut self, features: ArrayView2<f64>, labels: &[Diagnosis]);

    fn predict_proba(&self, features: ArrayView1<f64>) -> [f64; Diagnosis::COUNT];

    /// Arg-max of [`Classifier::predict_proba`]; ties go to the healthy class.
    fn predict(&self, features: ArrayView1<f64>) -> Diagnosis {
        let probabilities = self.predict_proba(features);
        if probabilities[Diagnosis::HeartDisease.index()]
            > probabilities[Diagnosis::Healthy.index()]
        {
            Diagnosis::HeartDisease
        } else {
            Diagnosis::Healthy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TrainedClassifier {
    RandomForest(RandomForest),
    Logistic(LogisticRegression),
}

impl TrainedClassifier {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        match config.kind {
            ClassifierKind::RandomForest => {
                TrainedClassifier::RandomForest(RandomForest::new(config.forest_params()))
            }
            ClassifierKind::Logistic => {
                TrainedClassifier::Logistic(LogisticRegression::new(config.logistic_params()))
            }
        }
    }

    pub fn kind(&self) -> ClassifierKind {
        match self {
            TrainedClassifier::RandomForest(_) => ClassifierKind::RandomForest,
            TrainedClassifier::Logistic(_) => ClassifierKind::Logistic,
        }
    }

    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        match self {
            TrainedClassifier::RandomForest(forest) => Some(forest.feature_importances()),
            TrainedClassifier::Logistic(_) => None,
        }
    }
}

impl Classifier for TrainedClassifier {
    fn fit(&mut self, features: ArrayView2<f64>, labels: &[Diagnosis]) {
        match self {
            TrainedClassifier::RandomForest(forest) => forest.fit(features, labels),
            TrainedClassifier::Logistic(model) => model.fit(features, labels),
        }
    }

    fn predict_proba(&self, features: ArrayView1<f64>) -> [f64; Diagnosis::COUNT] {
        match self {
            TrainedClassifier::RandomForest(forest) => forest.predict_proba(features),
            TrainedClassifier::Logistic(model) => model.predict_proba(features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_config_picks_kind() {
        let mut config = ClassifierConfig::default();
        assert_eq!(
            TrainedClassifier::from_config(&config).kind(),
            ClassifierKind::RandomForest
        );

        config.kind = ClassifierKind::Logistic;
        let classifier = TrainedClassifier::from_config(&config);
        assert_eq!(classifier.kind(), ClassifierKind::Logistic);
        assert!(classifier.feature_importances().is_none());
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let classifier = TrainedClassifier::from_config(&ClassifierConfig::default());
        let json = serde_json::to_value(&classifier).unwrap();

        assert_eq!(json["kind"], "random-forest");
    }

    #[test]
    fn test_predict_tie_goes_to_healthy() {
        struct Undecided;

        impl Classifier for Undecided {
            fn fit(&mut self, _: ArrayView2<f64>, _: &[Diagnosis]) {}

            fn predict_proba(&self, _: ArrayView1<f64>) -> [f64; Diagnosis::COUNT] {
                [0.5, 0.5]
            }
        }

        assert_eq!(Undecided.predict(array![0.0].view()), Diagnosis::Healthy);
    }
}
