//! Level specifications and their evaluation.

mod evaluate;
pub mod render;
mod spec;

pub use evaluate::*;
pub use spec::*;

use crate::prediction::PredictionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration and type errors of level evaluation. Always fatal.
#[derive(Error, Debug)]
pub enum LevelsError {
    #[error("invalid levels specification: {0}")]
    InvalidSpec(String),
    #[error("unknown levels type {0:?}")]
    UnknownTag(String),
    #[error("malformed fixed levels: {0}")]
    MalformedFixed(String),
    #[error("malformed predictive levels: {0}")]
    MalformedPredictive(String),
    #[error("predictive levels require a metric name")]
    MissingMetricName,
    #[error("predictive levels requested but no prediction source is available")]
    NoPredictionSource,
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Which side of a value the levels guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upper,
    Lower,
}
