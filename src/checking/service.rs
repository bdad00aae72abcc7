//! Folding a check's output stream into one service result.

use serde::Serialize;

use crate::api::{CheckOutput, CheckResult, IgnoreResults, Metric, State};

/// The verdict handed to the monitoring core for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCheckResult {
    pub state: State,
    pub output: String,
    pub metrics: Vec<Metric>,
    /// `false` if the result must not change the service state (ignored cycle).
    pub submit: bool,
}

impl ServiceCheckResult {
    pub fn item_not_found() -> Self {
        Self::unknown("Item not found in monitoring data")
    }

    pub fn unknown(output: impl Into<String>) -> Self {
        Self {
            state: State::Unknown,
            output: output.into(),
            metrics: Vec::new(),
            submit: true,
        }
    }

    /// Nothing to submit this cycle.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            state: State::Ok,
            output: reason.into(),
            metrics: Vec::new(),
            submit: false,
        }
    }

    /// Aggregate a check function's outputs.
    ///
    /// The state is the worst state of all results. An empty stream means the
    /// item was not found; any ignore marker makes the result unsubmittable.
    pub fn from_outputs(outputs: Vec<CheckOutput>) -> Self {
        let mut ignores = Vec::new();
        let mut results = Vec::new();
        let mut metrics = Vec::new();
        for output in outputs {
            match output {
                CheckOutput::Result(r) => results.push(r),
                CheckOutput::Metric(m) => metrics.push(m),
                CheckOutput::Ignore(i) => ignores.push(i),
            }
        }

        if ignores.is_empty() && results.is_empty() {
            return Self::item_not_found();
        }

        Self {
            state: State::worst(results.iter().map(|r| r.state)),
            output: aggregate_texts(&ignores, &results),
            metrics,
            submit: ignores.is_empty(),
        }
    }
}

fn add_state_marker(text: &str, marker: &str) -> String {
    if text.contains(marker) {
        text.to_string()
    } else {
        format!("{}{}", text, marker)
    }
}

/// Summary line (", "-joined) followed by one details line per result.
fn aggregate_texts(ignores: &[IgnoreResults], results: &[CheckResult]) -> String {
    let mut summaries: Vec<String> = ignores
        .iter()
        .filter(|i| !i.0.is_empty())
        .map(|i| i.0.clone())
        .collect();
    let mut details = Vec::new();
    let needs_marker = results.len() > 1;

    for result in results {
        let marker = if needs_marker { result.state.marker() } else { "" };
        if !result.summary.is_empty() {
            summaries.push(add_state_marker(&result.summary, marker));
        }
        details.push(add_state_marker(&result.details, marker));
    }

    if summaries.is_empty() {
        let count = details.len();
        summaries.push(format!(
            "Everything looks OK - {} detail{} available",
            count,
            if count == 1 { "" } else { "s" }
        ));
    }

    std::iter::once(summaries.join(", "))
        .chain(details)
        .collect::<Vec<_>>()
        .join("\n")
}
