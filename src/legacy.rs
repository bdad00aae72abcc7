//! Adapter for checks that still report classic `(state, text, perfdata)` tuples.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{CheckError, CheckOutput, CheckResult, Metric, State};
use crate::checking::{CheckContext, CheckPlugin};

/// One perfdata entry: `(name, value, warn, crit, min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyPerfdata {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub warn: Option<f64>,
    #[serde(default)]
    pub crit: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// A classic subresult. A missing text only contributes perfdata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyResult {
    pub state: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub perfdata: Vec<LegacyPerfdata>,
}

impl LegacyPerfdata {
    fn to_metric(&self) -> Metric {
        let levels = self.warn.zip(self.crit);
        let boundaries = match (self.min, self.max) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(f64::NEG_INFINITY), max.unwrap_or(f64::INFINITY))),
        };
        Metric::new(self.name.clone(), self.value)
            .with_levels(levels)
            .with_boundaries(boundaries)
    }
}

impl LegacyResult {
    /// Convert into results and metrics. States outside 0..=3 are a plugin bug.
    ///
    /// The first line of the text becomes the summary; all lines go to the details.
    pub fn into_outputs(self) -> Result<Vec<CheckOutput>, CheckError> {
        let state = State::from_code(self.state)
            .ok_or_else(|| CheckError::plugin(format!("Invalid state in legacy check result: {}", self.state)))?;

        let mut outputs = Vec::with_capacity(self.perfdata.len() + 1);
        if let Some(text) = self.text.filter(|t| !t.is_empty()) {
            let result = match text.split_once('\n') {
                Some((summary, _)) => CheckResult::with_details(state, summary, text.replace('\n', ", ")),
                None => CheckResult::new(state, text.as_str()),
            };
            outputs.push(result.into());
        } else if state != State::Ok {
            outputs.push(CheckResult::new(state, "(no text)").into());
        }
        outputs.extend(self.perfdata.iter().map(|p| p.to_metric().into()));
        Ok(outputs)
    }
}

/// Convert all subresults of a legacy check.
pub fn convert_legacy_results<I>(results: I) -> Result<Vec<CheckOutput>, CheckError>
where
    I: IntoIterator<Item = LegacyResult>,
{
    let mut outputs = Vec::new();
    for result in results {
        outputs.extend(result.into_outputs()?);
    }
    Ok(outputs)
}

/// Wrap a legacy check function as a check plugin.
pub fn legacy_plugin<F>(name: &str, check: F) -> CheckPlugin
where
    F: Fn(&mut CheckContext<'_>, Option<&str>, &Value, &Value) -> Result<Vec<LegacyResult>, CheckError>
        + Send
        + Sync
        + 'static,
{
    CheckPlugin::new(name, move |ctx, item, params, section| {
        convert_legacy_results(check(ctx, item, params, section)?)
    })
}
