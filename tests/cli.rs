//! Runs the built binaries the way an operator would.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const TRAIN: &str = env!("CARGO_BIN_EXE_heartrisk-train");
const PREDICT: &str = env!("CARGO_BIN_EXE_heartrisk-predict");

fn run(binary: &str, dir: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(binary)
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    if let Some(text) = stdin {
        child
            .stdin
            .take()
            .unwrap()
            .write_all(text.as_bytes())
            .unwrap();
    }

    child.wait_with_output().unwrap()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn trained_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("heart.csv"),
        "age,sex,target\n40,1,0\n60,1,1\n50,0,1\n",
    )
    .unwrap();

    let output = run(TRAIN, dir.path(), &[], None);
    assert!(output.status.success(), "{}", text(&output.stderr));
    dir
}

#[test]
fn test_trainer_without_input_file() {
    let dir = TempDir::new().unwrap();

    let output = run(TRAIN, dir.path(), &[], None);

    assert!(!output.status.success());
    let stderr = text(&output.stderr);
    assert!(stderr.contains("The file was not found at the path 'heart.csv'"), "{stderr}");
    assert!(!stderr.contains("panicked"), "{stderr}");
}

#[test]
fn test_trainer_writes_three_artifacts() {
    let dir = trained_dir();

    for name in ["scaler.json", "model.json", "feature_names.json"] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }
}

#[test]
fn test_trainer_is_quiet_on_success() {
    let dir = trained_dir();

    let output = run(TRAIN, dir.path(), &[], None);

    assert!(output.status.success(), "{}", text(&output.stderr));
    assert!(output.stdout.is_empty(), "{}", text(&output.stdout));
}

#[test]
fn test_predictor_without_artifacts() {
    let dir = TempDir::new().unwrap();

    let output = run(PREDICT, dir.path(), &[], None);

    assert!(!output.status.success());
    let stderr = text(&output.stderr);
    assert!(stderr.contains("Please run 'heartrisk-train' first"), "{stderr}");
    assert!(!stderr.contains("panicked"), "{stderr}");
}

#[test]
fn test_interactive_prediction_with_retry() {
    let dir = trained_dir();

    let output = run(PREDICT, dir.path(), &[], Some("sixty\n60\n1\n"));

    assert!(output.status.success(), "{}", text(&output.stderr));
    let stdout = text(&output.stdout);
    assert!(stdout.contains("Model and scaler loaded successfully."));
    assert_eq!(stdout.matches("Invalid input 'sixty'").count(), 1);
    assert!(stdout.contains("this person is LIKELY to have heart disease"), "{stdout}");
    assert!(stdout.contains("Confidence: "));
}

#[test]
fn test_values_flag_skips_prompts() {
    let dir = trained_dir();

    let output = run(PREDICT, dir.path(), &["--values", "60,1"], None);

    assert!(output.status.success(), "{}", text(&output.stderr));
    let stdout = text(&output.stdout);
    assert!(!stdout.contains("Enter value for"));
    assert!(stdout.contains("--- Prediction Result ---"));
}

#[test]
fn test_closed_stdin_fails_cleanly() {
    let dir = trained_dir();

    let output = run(PREDICT, dir.path(), &[], Some("60\n"));

    assert!(!output.status.success());
    let stderr = text(&output.stderr);
    assert!(stderr.contains("Input closed before a value for 'sex'"), "{stderr}");
}
