use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeartError {
    #[error("The file was not found at the path '{}'", path.display())]
    DataNotFound { path: PathBuf },

    #[error("Failed to load data from '{}': {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error(
        "Artifact '{}' not found. Please run 'heartrisk-train' first to create it.",
        path.display()
    )]
    ArtifactNotFound { path: PathBuf },

    #[error("Artifacts come from different training runs ({first} vs {second}); retrain to get a consistent bundle")]
    ArtifactMismatch { first: String, second: String },

    #[error("An error occurred while loading '{}': {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("Invalid input '{value}'. Please enter a number.")]
    InvalidInputValue { value: String },

    #[error("Input closed before a value for '{feature}' was entered")]
    InputClosed { feature: String },

    #[error("Expected {expected} feature values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HeartError>;
