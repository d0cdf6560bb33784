use std::io;
use std::process::ExitCode;

use clap::Parser;
use heartrisk::cli::{init_tracing, PredictArgs};
use heartrisk::predictor::Predictor;
use heartrisk::prompt;

fn run(args: &PredictArgs) -> anyhow::Result<()> {
    let predictor = Predictor::load(&args.artifacts)?;
    println!("Model and scaler loaded successfully.");

    let values = match &args.values {
        Some(list) => prompt::parse_value_list(list, predictor.feature_names().len())?,
        None => prompt::read_feature_vector(
            predictor.feature_names(),
            &mut io::stdin().lock(),
            &mut io::stdout().lock(),
        )?,
    };

    let prediction = predictor.predict(&values)?;
    tracing::debug!(probabilities = ?prediction.probabilities, "prediction");

    println!("\n--- Prediction Result ---");
    println!("{prediction}");
    Ok(())
}

fn main() -> ExitCode {
    let args = PredictArgs::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
