use ndarray::ArrayView1;
use std::fmt;
use std::path::Path;

use crate::artifacts::{ArtifactBundle, ArtifactPaths};
use crate::error::{HeartError, Result};
use crate::model::{Classifier, Normalizer};
use crate::parse::Diagnosis;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub diagnosis: Diagnosis,
    pub probabilities: [f64; Diagnosis::COUNT],
}

impl Prediction {
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.diagnosis.index()]
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match self.diagnosis {
            Diagnosis::HeartDisease => "LIKELY",
            Diagnosis::Healthy => "NOT LIKELY",
        };

        writeln!(
            f,
            "Prediction: The model predicts that this person is {verdict} to have heart disease."
        )?;
        write!(f, "Confidence: {:.2}%", self.confidence() * 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: ArtifactBundle,
}

impl Predictor {
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self { bundle }
    }

    pub fn load(artifact_dir: &Path) -> Result<Self> {
        ArtifactBundle::load(&ArtifactPaths::in_dir(artifact_dir)).map(Self::new)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.bundle.feature_names
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn predict(&self, values: &[f64]) -> Result<Prediction> {
        let expected = self.bundle.feature_names.len();
        if values.len() != expected {
            return Err(HeartError::DimensionMismatch {
                expected,
                actual: values.len(),
            });
        }

        if let Some(value) = values.iter().find(|v| !v.is_finite()) {
            return Err(HeartError::InvalidInputValue {
                value: value.to_string(),
            });
        }

        let scaled = self.bundle.scaler.transform_row(ArrayView1::from(values));
        let features = ArrayView1::from(&scaled);

        Ok(Prediction {
            diagnosis: self.bundle.classifier.predict(features),
            probabilities: self.bundle.classifier.predict_proba(features),
        })
    }
}
