//! File-backed baselines written by the forecasting model.
//!
//! Layout: `<prediction_dir>/<metric>_<group>.json`, where the group is derived
//! from the period (weekday name, day of month, `everyday`, `everyhour`).

use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::*;
use crate::levels::Direction;

/// One predicted point of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub average: f64,
    pub stdev: f64,
}

/// Precomputed prediction for one metric and period group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionData {
    pub period: Period,
    pub horizon: u32,
    /// Unix timestamp after which the baseline must be recomputed.
    pub valid_until: i64,
    /// Seconds covered by each point.
    pub step: u32,
    pub points: Vec<Option<PredictionPoint>>,
}

impl PredictionData {
    /// Read a baseline, `None` if it does not exist (yet).
    pub fn load(path: &Path) -> Result<Option<Self>, PredictionError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, path: &Path) -> Result<(), PredictionError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// The point covering `offset` seconds into the slice.
    pub fn point_at(&self, offset: u32) -> Option<PredictionPoint> {
        if self.step == 0 {
            return None;
        }
        self.points
            .get((offset / self.step) as usize)
            .copied()
            .flatten()
    }
}

impl Period {
    /// Name of the group `time` belongs to.
    pub fn group(self, time: DateTime<Utc>) -> String {
        match self {
            Period::Wday => weekday_name(time.weekday()).to_string(),
            Period::Day => format!("{:02}", time.day()),
            Period::Hour => "everyday".to_string(),
            Period::Minute => "everyhour".to_string(),
        }
    }

    /// Seconds since the start of the slice containing `time`.
    pub fn slice_offset(self, time: DateTime<Utc>) -> u32 {
        match self {
            Period::Wday | Period::Day | Period::Hour => time.num_seconds_from_midnight(),
            Period::Minute => time.minute() * 60 + time.second(),
        }
    }
}

fn weekday_name(day: chrono::Weekday) -> &'static str {
    use chrono::Weekday::*;
    match day {
        Mon => "monday",
        Tue => "tuesday",
        Wed => "wednesday",
        Thu => "thursday",
        Fri => "friday",
        Sat => "saturday",
        Sun => "sunday",
    }
}

/// Baseline directory of one service of one host.
pub fn prediction_dir_for(root: &Path, host: &str, service: &str) -> PathBuf {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));
    root.join(re.replace_all(host, "_").as_ref())
        .join(re.replace_all(service, "_").as_ref())
}

/// Looks predictions up in baseline files.
#[derive(Debug, Clone, Default)]
pub struct PredictionStore {
    fixed_now: Option<DateTime<Utc>>,
}

impl PredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that evaluates every lookup at a fixed point in time.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            fixed_now: Some(now),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    pub fn baseline_path(dir: &Path, metric: &str, group: &str) -> PathBuf {
        dir.join(format!("{}_{}.json", metric, group))
    }
}

impl PredictionLookup for PredictionStore {
    fn lookup(
        &self,
        metric: &str,
        direction: Direction,
        params: &PredictionParameters,
        injected: Option<&InjectedParameters>,
    ) -> Result<PredictedLevels, PredictionError> {
        let Some(injected) = injected else {
            tracing::debug!("No prediction location injected for {}", metric);
            return Ok(PredictedLevels::default());
        };

        let now = self.now();
        let group = params.period.group(now);
        let path = Self::baseline_path(&injected.prediction_dir, metric, &group);

        let Some(data) = PredictionData::load(&path)? else {
            tracing::debug!("No prediction for {} yet ({})", metric, path.display());
            return Ok(PredictedLevels::default());
        };

        if data.period != params.period || data.horizon != params.horizon {
            tracing::debug!("Prediction for {} was computed with other parameters", metric);
            return Ok(PredictedLevels::default());
        }
        if data.valid_until < now.timestamp() {
            tracing::debug!("Prediction for {} is outdated", metric);
            return Ok(PredictedLevels::default());
        }

        let Some(point) = data.point_at(params.period.slice_offset(now)) else {
            return Ok(PredictedLevels::default());
        };

        Ok(PredictedLevels {
            prediction: Some(point.average),
            levels: Some(estimate_levels(
                point.average,
                point.stdev,
                direction,
                &params.levels,
                params.bound,
            )),
        })
    }
}
