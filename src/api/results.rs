//! Result, metric and ignore primitives emitted by check functions.

use super::State;
use serde::{Deserialize, Serialize};

/// A classified piece of check output.
///
/// `summary` is shown inline in the service output, `details` only on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub state: State,
    pub summary: String,
    pub details: String,
}

impl CheckResult {
    /// A headline result. The details repeat the summary.
    pub fn new(state: State, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        Self {
            state,
            details: summary.clone(),
            summary,
        }
    }

    pub fn with_details(
        state: State,
        summary: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            state,
            summary: summary.into(),
            details: details.into(),
        }
    }

    /// A low-priority result: only shown in the details while OK,
    /// promoted to the summary once the state is not OK.
    pub fn notice(state: State, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            state,
            summary: if state == State::Ok {
                String::new()
            } else {
                text.clone()
            },
            details: text,
        }
    }

    /// Whether this result only carries notice text.
    pub fn is_notice(&self) -> bool {
        self.summary.is_empty()
    }

    /// The most prominent text of this result.
    pub fn text(&self) -> &str {
        if self.summary.is_empty() {
            &self.details
        } else {
            &self.summary
        }
    }
}

/// A performance value attached to a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// (warn, crit)
    pub levels: Option<(f64, f64)>,
    /// (min, max)
    pub boundaries: Option<(f64, f64)>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            levels: None,
            boundaries: None,
        }
    }

    pub fn with_levels(mut self, levels: Option<(f64, f64)>) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_boundaries(mut self, boundaries: Option<(f64, f64)>) -> Self {
        self.boundaries = boundaries;
        self
    }

    /// Perfdata syntax of the monitoring core: `name=value;warn;crit;min;max`.
    pub fn perfdata(&self) -> String {
        let (warn, crit) = self.levels.map_or((None, None), |(w, c)| (Some(w), Some(c)));
        let (min, max) = self.boundaries.map_or((None, None), |(l, u)| (Some(l), Some(u)));
        format!(
            "{}={};{};{};{};{}",
            self.name,
            perf_value(Some(self.value)),
            perf_value(warn),
            perf_value(crit),
            perf_value(min),
            perf_value(max)
        )
    }
}

fn perf_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let text = format!("{:.6}", v);
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => String::new(),
    }
}

/// No verdict available this cycle. Not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoreResults(pub String);

/// One element of a check function's output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutput {
    Result(CheckResult),
    Metric(Metric),
    Ignore(IgnoreResults),
}

impl CheckOutput {
    pub fn as_result(&self) -> Option<&CheckResult> {
        match self {
            CheckOutput::Result(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_metric(&self) -> Option<&Metric> {
        match self {
            CheckOutput::Metric(m) => Some(m),
            _ => None,
        }
    }
}

impl From<CheckResult> for CheckOutput {
    fn from(r: CheckResult) -> Self {
        CheckOutput::Result(r)
    }
}

impl From<Metric> for CheckOutput {
    fn from(m: Metric) -> Self {
        CheckOutput::Metric(m)
    }
}

impl From<IgnoreResults> for CheckOutput {
    fn from(i: IgnoreResults) -> Self {
        CheckOutput::Ignore(i)
    }
}
