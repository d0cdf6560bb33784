use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{ClassifierKind, TrainerConfig};
use crate::error::Result;

/// Train the heart-disease classifier and save its artifacts
#[derive(Parser, Debug)]
#[command(name = "heartrisk-train", version)]
pub struct TrainArgs {
    /// Training CSV with a `target` column [default: heart.csv]
    #[arg(short, long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Directory the artifacts are written to [default: .]
    #[arg(short, long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Classifier to train
    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierKind>,

    /// Seed for bootstrap sampling and the hold-out shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of trees in the random forest
    #[arg(long)]
    pub trees: Option<usize>,

    /// Share of rows held out for the accuracy report (0 disables it)
    #[arg(long, value_name = "RATIO")]
    pub validation_ratio: Option<f64>,

    /// Verbosity: -v (info), -vv (debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl TrainArgs {
    /// Config file (or defaults) with the flags given on the command line
    /// applied on top.
    pub fn into_config(self) -> Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::load(path)?,
            None => TrainerConfig::default(),
        };

        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(artifacts) = self.artifacts {
            config.artifact_dir = artifacts;
        }
        if let Some(kind) = self.classifier {
            config.classifier.kind = kind;
        }
        if let Some(seed) = self.seed {
            config.classifier.seed = seed;
        }
        if let Some(trees) = self.trees {
            config.classifier.n_estimators = trees;
        }
        if let Some(ratio) = self.validation_ratio {
            config.validation_ratio = ratio;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Predict heart-disease risk for one patient from saved artifacts
#[derive(Parser, Debug)]
#[command(name = "heartrisk-predict", version)]
pub struct PredictArgs {
    /// Directory holding the trained artifacts
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub artifacts: PathBuf,

    /// Comma-separated feature values in training order, instead of prompting
    #[arg(long, value_name = "LIST", allow_hyphen_values = true)]
    pub values: Option<String>,

    /// Verbosity: -v (info), -vv (debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Installs a stderr `fmt` subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    // ignore an already-installed subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_commands_are_well_formed() {
        TrainArgs::command().debug_assert();
        PredictArgs::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_uses_defaults() {
        let args = TrainArgs::try_parse_from(["heartrisk-train"]).unwrap();
        assert_eq!(args.into_config().unwrap(), TrainerConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "validation_ratio = 0.3\n[classifier]\nseed = 7\nn_estimators = 10").unwrap();

        let args = TrainArgs::try_parse_from([
            "heartrisk-train",
            "--config",
            file.path().to_str().unwrap(),
            "--seed",
            "99",
            "--classifier",
            "logistic",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.classifier.seed, 99);
        assert_eq!(config.classifier.n_estimators, 10);
        assert_eq!(config.classifier.kind, ClassifierKind::Logistic);
        assert!((config.validation_ratio - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args =
            TrainArgs::try_parse_from(["heartrisk-train", "--validation-ratio", "1.5"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_predict_values_flag() {
        let args =
            PredictArgs::try_parse_from(["heartrisk-predict", "--values", "-1,2", "-vv"]).unwrap();

        assert_eq!(args.values.as_deref(), Some("-1,2"));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.artifacts, PathBuf::from("."));
    }
}
