use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{HeartError, Result};
use crate::model::TrainedClassifier;
use crate::scaler::StandardScaler;

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    run_id: Uuid,
    payload: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
    pub feature_names: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            scaler: dir.join(SCALER_FILE),
            model: dir.join(MODEL_FILE),
            feature_names: dir.join(FEATURE_NAMES_FILE),
        }
    }

    fn all(&self) -> [&Path; 3] {
        [&self.scaler, &self.model, &self.feature_names]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub run_id: Uuid,
    pub scaler: StandardScaler,
    pub classifier: TrainedClassifier,
    pub feature_names: Vec<String>,
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_envelope<T: Serialize>(path: &Path, run_id: Uuid, payload: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, &Envelope { run_id, payload })?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(())
}

fn remove_temporary(path: &Path) {
    let removed = if path.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };

    if let Err(err) = removed {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), %err, "failed to remove temporary artifact");
        }
    }
}

fn read_envelope<T: DeserializeOwned>(path: &Path) -> Result<Envelope<T>> {
    let file = File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => HeartError::ArtifactNotFound {
            path: path.to_path_buf(),
        },
        _ => HeartError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|err| HeartError::ArtifactCorrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

impl ArtifactBundle {
    pub fn new(
        scaler: StandardScaler,
        classifier: TrainedClassifier,
        feature_names: Vec<String>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            scaler,
            classifier,
            feature_names,
        }
    }

    /// Writes all three artifacts to temporary files, then renames them over
    /// any previous bundle. Leftover temporary files are removed on failure.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        for path in paths.all() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        if let Err(err) = self.write_and_rename(paths) {
            for path in paths.all() {
                remove_temporary(&temporary_path(path));
            }
            return Err(err);
        }

        info!(run_id = %self.run_id, "artifacts saved");
        Ok(())
    }

    fn write_and_rename(&self, paths: &ArtifactPaths) -> Result<()> {
        write_envelope(&temporary_path(&paths.scaler), self.run_id, &self.scaler)?;
        write_envelope(&temporary_path(&paths.model), self.run_id, &self.classifier)?;
        write_envelope(
            &temporary_path(&paths.feature_names),
            self.run_id,
            &self.feature_names,
        )?;

        for path in paths.all() {
            fs::rename(temporary_path(path), path)?;
        }

        Ok(())
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        if let Some(missing) = paths.all().into_iter().find(|path| !path.exists()) {
            return Err(HeartError::ArtifactNotFound {
                path: missing.to_path_buf(),
            });
        }

        let scaler: Envelope<StandardScaler> = read_envelope(&paths.scaler)?;
        let classifier: Envelope<TrainedClassifier> = read_envelope(&paths.model)?;
        let feature_names: Envelope<Vec<String>> = read_envelope(&paths.feature_names)?;

        for run_id in [classifier.run_id, feature_names.run_id] {
            if run_id != scaler.run_id {
                return Err(HeartError::ArtifactMismatch {
                    first: scaler.run_id.to_string(),
                    second: run_id.to_string(),
                });
            }
        }

        if scaler.payload.dimensions() != feature_names.payload.len() {
            return Err(HeartError::ArtifactCorrupt {
                path: paths.scaler.clone(),
                reason: format!(
                    "scaler has {} features but {} feature names were saved",
                    scaler.payload.dimensions(),
                    feature_names.payload.len()
                ),
            });
        }

        debug!(run_id = %scaler.run_id, features = feature_names.payload.len(), "artifacts loaded");

        Ok(Self {
            run_id: scaler.run_id,
            scaler: scaler.payload,
            classifier: classifier.payload,
            feature_names: feature_names.payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use tempfile::TempDir;

    fn bundle() -> ArtifactBundle {
        ArtifactBundle::new(
            StandardScaler {
                means: vec![50.0, 0.5],
                scales: vec![10.0, 0.5],
            },
            TrainedClassifier::from_config(&ClassifierConfig::default()),
            vec!["age".to_string(), "sex".to_string()],
        )
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let original = bundle();

        original.save(&paths).unwrap();
        let loaded = ArtifactBundle::load(&paths).unwrap();

        assert_eq!(loaded, original);
        assert!(!temporary_path(&paths.model).exists());
    }

    #[test]
    fn test_missing_artifact_is_reported() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(matches!(err, HeartError::ArtifactNotFound { .. }));

        bundle().save(&paths).unwrap();
        fs::remove_file(&paths.feature_names).unwrap();

        match ArtifactBundle::load(&paths).unwrap_err() {
            HeartError::ArtifactNotFound { path } => assert_eq!(path, paths.feature_names),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mixed_runs_rejected() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let first_paths = ArtifactPaths::in_dir(first.path());
        let second_paths = ArtifactPaths::in_dir(second.path());

        bundle().save(&first_paths).unwrap();
        bundle().save(&second_paths).unwrap();
        fs::copy(&first_paths.model, &second_paths.model).unwrap();

        let err = ArtifactBundle::load(&second_paths).unwrap_err();
        assert!(matches!(err, HeartError::ArtifactMismatch { .. }));
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());

        bundle().save(&paths).unwrap();
        fs::write(&paths.scaler, "not json").unwrap();

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(matches!(err, HeartError::ArtifactCorrupt { .. }));
    }

    #[test]
    fn test_failed_save_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        fs::create_dir(temporary_path(&paths.model)).unwrap();

        assert!(bundle().save(&paths).is_err());

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn test_temporary_path() {
        assert_eq!(
            temporary_path(Path::new("out/model.json")),
            PathBuf::from("out/model.json.tmp")
        );
    }
}
