use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use heartrisk::cli::{init_tracing, TrainArgs};
use heartrisk::{trainer, HeartError};
use tracing::info;

fn run(args: TrainArgs) -> anyhow::Result<()> {
    let config = args.into_config().context("invalid trainer configuration")?;
    let report = trainer::train(&config)?;

    info!(
        features = report.feature_names.len(),
        rows = report.rows,
        dir = %config.artifact_dir.display(),
        "model, scaler, and feature names saved"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = TrainArgs::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(HeartError::DataNotFound { .. }) = err.downcast_ref::<HeartError>() {
                eprintln!("Please make sure the training CSV exists, or pass its location with --data.");
            }
            ExitCode::FAILURE
        }
    }
}
