//! Prediction lookup for predictive levels.
//!
//! The forecasting model itself lives elsewhere; this module only knows how to
//! find a precomputed reference value for "now" and turn it into levels.

mod store;

pub use store::*;

use crate::levels::Direction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Prediction error types.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("failed to read prediction: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid prediction data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Time frame a prediction repeats in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Same weekday, one day slices.
    Wday,
    /// Same day of the month, one day slices.
    Day,
    /// Every day alike, one day slices.
    Hour,
    /// Every hour alike, one hour slices.
    Minute,
}

/// How the configured margins are applied to the reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginKind {
    Absolute,
    Relative,
    Stdev,
}

/// User parameters of predictive levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionParameters {
    pub period: Period,
    /// Days of history the prediction is computed from.
    pub horizon: u32,
    pub levels: (MarginKind, (f64, f64)),
    /// Levels are never tighter than this (warn, crit).
    #[serde(default)]
    pub bound: Option<(f64, f64)>,
}

/// Parameters the engine adds before a check runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectedParameters {
    /// Directory holding the baselines of one host's service.
    pub prediction_dir: PathBuf,
}

/// Outcome of a lookup: the reference value and the estimated (warn, crit).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PredictedLevels {
    pub prediction: Option<f64>,
    pub levels: Option<(f64, f64)>,
}

/// Source of predictions.
pub trait PredictionLookup: Send + Sync {
    fn lookup(
        &self,
        metric: &str,
        direction: Direction,
        params: &PredictionParameters,
        injected: Option<&InjectedParameters>,
    ) -> Result<PredictedLevels, PredictionError>;
}

/// A lookup that never has a prediction.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPredictions;

impl PredictionLookup for NoPredictions {
    fn lookup(
        &self,
        _metric: &str,
        _direction: Direction,
        _params: &PredictionParameters,
        _injected: Option<&InjectedParameters>,
    ) -> Result<PredictedLevels, PredictionError> {
        Ok(PredictedLevels::default())
    }
}

/// Turn a reference value into (warn, crit) levels.
pub fn estimate_levels(
    reference: f64,
    stdev: f64,
    direction: Direction,
    margins: &(MarginKind, (f64, f64)),
    bound: Option<(f64, f64)>,
) -> (f64, f64) {
    let sign = match direction {
        Direction::Upper => 1.0,
        Direction::Lower => -1.0,
    };
    let (kind, (warn, crit)) = *margins;
    let apply = |margin: f64| match kind {
        MarginKind::Absolute => reference + sign * margin,
        MarginKind::Relative => reference * (1.0 + sign * margin / 100.0),
        MarginKind::Stdev => reference + sign * margin * stdev,
    };
    let levels = (apply(warn), apply(crit));

    match (bound, direction) {
        (None, _) => levels,
        (Some((bw, bc)), Direction::Upper) => (levels.0.max(bw), levels.1.max(bc)),
        (Some((bw, bc)), Direction::Lower) => (levels.0.min(bw), levels.1.min(bc)),
    }
}
