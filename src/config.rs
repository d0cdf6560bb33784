use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HeartError, Result};
use crate::logistic_regression::LogisticParams;
use crate::random_forest::ForestParams;

pub const DEFAULT_DATA_PATH: &str = "heart.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    RandomForest,
    Logistic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    pub seed: u64,

    // random forest
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,

    // logistic regression
    pub learning_rate: f64,
    pub regularization: f64,
    pub epochs: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let forest = ForestParams::default();
        let logistic = LogisticParams::default();

        Self {
            kind: ClassifierKind::RandomForest,
            seed: forest.seed,
            n_estimators: forest.n_estimators,
            max_depth: forest.max_depth,
            min_samples_split: forest.min_samples_split,
            learning_rate: logistic.learning_rate,
            regularization: logistic.elastic_net_regularization,
            epochs: logistic.epochs,
        }
    }
}

impl ClassifierConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
        }
    }

    pub fn logistic_params(&self) -> LogisticParams {
        LogisticParams {
            learning_rate: self.learning_rate,
            elastic_net_regularization: self.regularization,
            epochs: self.epochs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub data_path: PathBuf,
    pub artifact_dir: PathBuf,
    pub validation_ratio: f64,
    pub classifier: ClassifierConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            artifact_dir: PathBuf::from("."),
            validation_ratio: 0.2,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl TrainerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            HeartError::Config(format!("cannot read '{}': {err}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|err| HeartError::Config(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.validation_ratio) {
            return Err(HeartError::Config(format!(
                "validation_ratio must be in [0, 1), got {}",
                self.validation_ratio
            )));
        }

        let classifier = &self.classifier;
        if classifier.n_estimators == 0 {
            return Err(HeartError::Config("n_estimators must be at least 1".into()));
        }
        if classifier.min_samples_split < 2 {
            return Err(HeartError::Config(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if !(classifier.learning_rate.is_finite() && classifier.learning_rate > 0.0) {
            return Err(HeartError::Config(
                "learning_rate must be a positive number".into(),
            ));
        }
        if !(classifier.regularization.is_finite() && classifier.regularization >= 0.0) {
            return Err(HeartError::Config(
                "regularization must be zero or positive".into(),
            ));
        }
        if classifier.epochs == 0 {
            return Err(HeartError::Config("epochs must be at least 1".into()));
        }

        Ok(())
    }
}
