use csv::ReaderBuilder;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HeartError, Result};

pub const TARGET_COLUMN: &str = "target";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Diagnosis {
    Healthy,
    HeartDisease,
}

impl Diagnosis {
    pub const COUNT: usize = 2;

    pub fn index(self) -> usize {
        match self {
            Diagnosis::Healthy => 0,
            Diagnosis::HeartDisease => 1,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Diagnosis::Healthy => -1.0,
            Diagnosis::HeartDisease => 1.0,
        }
    }
}

#[allow(clippy::float_cmp)]
pub fn to_diagnosis(target: &str) -> Option<Diagnosis> {
    match target.trim().parse::<f64>() {
        Ok(value) if value == 0.0 => Some(Diagnosis::Healthy),
        Ok(value) if value == 1.0 => Some(Diagnosis::HeartDisease),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Vec<f64>,
    pub diagnosis: Diagnosis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub samples: Vec<Sample>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.feature_names.len()
    }

    pub fn features(&self) -> Array2<f64> {
        let data: Vec<f64> = self
            .samples
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        Array2::from_shape_vec((self.len(), self.dimensions()), data)
            .unwrap_or_else(|_| Array2::zeros((0, self.dimensions())))
    }

    pub fn labels(&self) -> Vec<Diagnosis> {
        self.samples.iter().map(|s| s.diagnosis).collect()
    }

    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            samples: indices.iter().map(|&i| self.samples[i].clone()).collect(),
        }
    }
}

pub fn parse(file_path: &Path) -> Result<Dataset> {
    let file = File::open(file_path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => HeartError::DataNotFound {
            path: file_path.to_path_buf(),
        },
        _ => HeartError::DataLoad {
            path: file_path.to_path_buf(),
            reason: err.to_string(),
        },
    })?;

    let dataset = parse_reader(BufReader::new(file), file_path)?;
    debug!(
        path = %file_path.display(),
        rows = dataset.len(),
        features = dataset.dimensions(),
        "parsed training table"
    );

    Ok(dataset)
}

/// Parses CSV text from any reader; `source` only labels errors.
pub fn parse_reader<R: Read>(reader: R, source: &Path) -> Result<Dataset> {
    let load_error = |reason: String| HeartError::DataLoad {
        path: PathBuf::from(source),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|err| load_error(err.to_string()))?
        .clone();

    let target_index = headers
        .iter()
        .position(|name| name == TARGET_COLUMN)
        .ok_or_else(|| load_error(format!("no '{TARGET_COLUMN}' column in header")))?;

    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != target_index)
        .map(|(_, name)| name.to_string())
        .collect();

    if feature_names.is_empty() {
        return Err(load_error("no feature columns besides 'target'".into()));
    }

    let mut samples = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|err| load_error(err.to_string()))?;
        let line = record.position().map_or(0, csv::Position::line);

        let target = record.get(target_index).unwrap_or_default();
        let diagnosis = to_diagnosis(target).ok_or_else(|| {
            load_error(format!(
                "line {line}: target must be 0 or 1, found '{target}'"
            ))
        })?;

        let mut features = Vec::with_capacity(feature_names.len());
        for (index, value) in record.iter().enumerate() {
            if index == target_index {
                continue;
            }

            let parsed = value.parse::<f64>().ok().filter(|v| v.is_finite());
            let Some(parsed) = parsed else {
                return Err(load_error(format!(
                    "line {line}: column '{}' has non-numeric value '{value}'",
                    headers.get(index).unwrap_or_default()
                )));
            };
            features.push(parsed);
        }

        samples.push(Sample {
            features,
            diagnosis,
        });
    }

    if samples.is_empty() {
        return Err(load_error("table has no rows".into()));
    }

    Ok(Dataset {
        feature_names,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> Result<Dataset> {
        parse_reader(text.as_bytes(), Path::new("inline.csv"))
    }

    #[test]
    fn test_feature_order_follows_header() {
        let dataset = parse_str("age,target,sex\n40,0,1\n60,1,1\n").unwrap();

        assert_eq!(dataset.feature_names, vec!["age", "sex"]);
        assert_eq!(dataset.samples[0].features, vec![40.0, 1.0]);
        assert_eq!(dataset.samples[1].diagnosis, Diagnosis::HeartDisease);
    }

    #[test]
    fn test_missing_target_column() {
        let err = parse_str("age,sex\n40,1\n").unwrap_err();
        assert!(err.to_string().contains("no 'target' column"));
    }

    #[test]
    fn test_non_numeric_cell_names_line_and_column() {
        let err = parse_str("age,sex,target\n40,1,0\nold,1,1\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("'age'"), "{message}");
    }

    #[test]
    fn test_label_outside_binary_range() {
        let err = parse_str("age,target\n40,2\n").unwrap_err();
        assert!(err.to_string().contains("target must be 0 or 1"));
    }

    #[test]
    fn test_float_labels_accepted() {
        let dataset = parse_str("age,target\n40,1.0\n41,0.0\n").unwrap();
        assert_eq!(
            dataset.labels(),
            vec![Diagnosis::HeartDisease, Diagnosis::Healthy]
        );
    }

    #[test]
    fn test_empty_table() {
        assert!(parse_str("age,target\n").is_err());
        assert!(parse_str("target\n1\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = parse(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, HeartError::DataNotFound { .. }));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[test]
    fn test_feature_matrix_shape() {
        let dataset = parse_str("a,b,target\n1,2,0\n3,4,1\n5,6,1\n").unwrap();
        let matrix = dataset.features();

        assert_eq!(matrix.dim(), (3, 2));
        assert_eq!(matrix[(2, 1)], 6.0);
    }
}
