use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifacts::{ArtifactBundle, ArtifactPaths};
use crate::config::{ClassifierConfig, TrainerConfig};
use crate::error::Result;
use crate::model::{Classifier, Normalizer, TrainedClassifier};
use crate::parse::{self, Dataset};
use crate::scaler::StandardScaler;

#[derive(Debug, Clone, PartialEq)]
pub struct HoldoutReport {
    pub train_size: usize,
    pub validation_size: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub run_id: Uuid,
    pub rows: usize,
    pub feature_names: Vec<String>,
    pub feature_importances: Option<Vec<(String, f64)>>,
    pub holdout: Option<HoldoutReport>,
}

fn split(indices: &[usize], train_ratio: f64) -> (Vec<usize>, Vec<usize>) {
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    let train_size = (indices.len() as f64 * train_ratio) as usize;
    let (first, second) = indices.split_at(train_size.min(indices.len()));

    (first.to_vec(), second.to_vec())
}

pub fn fit_bundle(dataset: &Dataset, config: &ClassifierConfig) -> ArtifactBundle {
    let features = dataset.features();
    let labels = dataset.labels();

    let scaler = StandardScaler::fit(features.view());
    let scaled = scaler.transform(features.view());

    let mut classifier = TrainedClassifier::from_config(config);
    classifier.fit(scaled.view(), &labels);

    ArtifactBundle::new(scaler, classifier, dataset.feature_names.clone())
}

/// Accuracy of a model fit on a seeded shuffle of `1 - validation_ratio` of
/// the rows and scored on the rest. `None` when either part would be empty.
pub fn evaluate_holdout(
    dataset: &Dataset,
    config: &ClassifierConfig,
    validation_ratio: f64,
) -> Option<HoldoutReport> {
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(config.seed));

    let (train_indices, validation_indices) = split(&indices, 1.0 - validation_ratio);
    if train_indices.is_empty() || validation_indices.is_empty() {
        return None;
    }

    let bundle = fit_bundle(&dataset.subset(&train_indices), config);
    let validation = dataset.subset(&validation_indices);
    let scaled = bundle.scaler.transform(validation.features().view());

    let mut correct_predictions = 0;
    for (row, sample) in scaled.rows().into_iter().zip(&validation.samples) {
        if bundle.classifier.predict(row) == sample.diagnosis {
            correct_predictions += 1;
        }
    }

    Some(HoldoutReport {
        train_size: train_indices.len(),
        validation_size: validation_indices.len(),
        accuracy: correct_predictions as f64 / validation_indices.len() as f64,
    })
}

fn ranked_importances(feature_names: &[String], importances: &[f64]) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = feature_names
        .iter()
        .cloned()
        .zip(importances.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

pub fn train(config: &TrainerConfig) -> Result<TrainingReport> {
    config.validate()?;

    let dataset = parse::parse(&config.data_path)?;
    info!(
        path = %config.data_path.display(),
        rows = dataset.len(),
        features = dataset.dimensions(),
        "Successfully loaded data"
    );

    let holdout = if config.validation_ratio > 0.0 {
        let report = evaluate_holdout(&dataset, &config.classifier, config.validation_ratio);
        match &report {
            Some(report) => info!(
                train = report.train_size,
                validation = report.validation_size,
                "hold-out accuracy: {:.3}%",
                report.accuracy * 100.0
            ),
            None => warn!(
                rows = dataset.len(),
                ratio = config.validation_ratio,
                "too few rows for a hold-out split, skipping evaluation"
            ),
        }
        report
    } else {
        None
    };

    let bundle = fit_bundle(&dataset, &config.classifier);
    info!(
        classifier = ?bundle.classifier.kind(),
        "Model has been trained on the full dataset"
    );

    let feature_importances = bundle
        .classifier
        .feature_importances()
        .map(|importances| ranked_importances(&bundle.feature_names, &importances));

    if let Some(ranked) = &feature_importances {
        for (feature, importance) in ranked {
            info!(%feature, importance = *importance, "feature importance");
        }
    }

    bundle.save(&ArtifactPaths::in_dir(&config.artifact_dir))?;

    Ok(TrainingReport {
        run_id: bundle.run_id,
        rows: dataset.len(),
        feature_names: bundle.feature_names,
        feature_importances,
        holdout,
    })
}
