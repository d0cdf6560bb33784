pub mod artifacts;
pub mod cli;
pub mod config;
pub mod decision_tree;
pub mod error;
pub mod logistic_regression;
pub mod model;
pub mod parse;
pub mod predictor;
pub mod prompt;
pub mod random_forest;
pub mod scaler;
pub mod trainer;

pub use error::{HeartError, Result};
