//! Picking the node that speaks for the cluster and folding in the others.

use super::{ClusterMode, ClusterParams, NodeOutcome, NodeResults};
use crate::api::{CheckOutput, CheckResult, IgnoreResultsError, Metric, State};
use crate::levels::{check_fixed_levels, render, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Worst,
    Best,
}

/// Summarizes per-node outcomes for the worst, best and failover modes.
#[derive(Debug, Clone)]
pub struct NodeSelector<'a> {
    label: &'static str,
    selection: Selection,
    primary_node: Option<&'a str>,
    metrics_node: Option<&'a str>,
    levels_additional_nodes_count: Option<(f64, f64)>,
}

impl<'a> NodeSelector<'a> {
    pub fn new(mode: ClusterMode, params: &'a ClusterParams) -> Self {
        Self {
            label: mode.label(),
            selection: match mode {
                ClusterMode::Best => Selection::Best,
                _ => Selection::Worst,
            },
            primary_node: params.primary_node.as_deref(),
            metrics_node: params.metrics_node.as_deref(),
            levels_additional_nodes_count: params
                .levels_additional_nodes_count
                .or_else(|| mode.default_additional_nodes_levels()),
        }
    }

    /// Merge the node outcomes into one output stream.
    ///
    /// Fails if any node was ignored. Nodes without results are left out;
    /// if no node reports, the stream is empty.
    pub fn summarize(&self, node_results: &NodeResults) -> Result<Vec<CheckOutput>, IgnoreResultsError> {
        let ignored: Vec<String> = node_results
            .iter()
            .filter(|(_, outcome)| !outcome.ignores.is_empty())
            .map(|(node, outcome)| format!("[{}] {}", node, outcome.ignores.join(", ")))
            .collect();
        if !ignored.is_empty() {
            return Err(IgnoreResultsError(ignored.join(" ")));
        }

        let reporting: Vec<(&str, &NodeOutcome, State)> = node_results
            .iter()
            .filter(|(_, outcome)| !outcome.results.is_empty())
            .map(|(node, outcome)| {
                let state = State::worst(outcome.results.iter().map(|r| r.state));
                (node.as_str(), outcome, state)
            })
            .collect();

        let Some(pivot) = self.select_pivot(&reporting) else {
            return Ok(Vec::new());
        };
        let (pivot_node, pivot_outcome, _) = reporting[pivot];

        let mut outputs: Vec<CheckOutput> = Vec::new();
        outputs.push(self.header(pivot_node).into());
        outputs.extend(pivot_outcome.results.iter().cloned().map(CheckOutput::from));

        let secondary: Vec<(&str, &NodeOutcome)> = reporting
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != pivot)
            .map(|(_, (node, outcome, _))| (*node, *outcome))
            .collect();

        if !secondary.is_empty() {
            outputs.push(self.additional_nodes(&secondary).into());
            for (node, outcome) in &secondary {
                for result in &outcome.results {
                    let text = format!("[{}]: {}", node, result.details);
                    let marker = result.state.marker();
                    let text = if text.contains(marker) {
                        text
                    } else {
                        format!("{}{}", text, marker)
                    };
                    outputs.push(CheckResult::notice(State::Ok, text).into());
                }
            }
        }

        outputs.extend(self.metrics(node_results, pivot_outcome));
        Ok(outputs)
    }

    /// Index of the node that represents the cluster.
    fn select_pivot(&self, reporting: &[(&str, &NodeOutcome, State)]) -> Option<usize> {
        if let Some(primary) = self.primary_node {
            if let Some(idx) = reporting.iter().position(|(node, _, _)| *node == primary) {
                return Some(idx);
            }
        }

        let mut selected: Option<(usize, State)> = None;
        for (idx, (_, _, state)) in reporting.iter().enumerate() {
            selected = match selected {
                None => Some((idx, *state)),
                Some((_, current)) if self.prefers(*state, current) => Some((idx, *state)),
                keep => keep,
            };
        }
        selected.map(|(idx, _)| idx)
    }

    /// Whether `candidate` strictly beats `current` under the selection.
    fn prefers(&self, candidate: State, current: State) -> bool {
        match self.selection {
            Selection::Worst => current.worse(candidate) != current,
            Selection::Best => current.better(candidate) != current,
        }
    }

    fn header(&self, pivot_node: &str) -> CheckResult {
        let summary = format!("{}: [{}]", self.label, pivot_node);
        match self.primary_node {
            Some(primary) if primary != pivot_node => {
                let details = format!("{}, preferred node is [{}]", summary, primary);
                CheckResult::with_details(State::Warn, summary, details)
            }
            _ => CheckResult::new(State::Ok, summary),
        }
    }

    fn additional_nodes(&self, secondary: &[(&str, &NodeOutcome)]) -> CheckResult {
        let count = secondary.len() as f64;
        let state = check_fixed_levels(count, self.levels_additional_nodes_count, Direction::Upper);
        let nodes: Vec<String> = secondary.iter().map(|(node, _)| format!("[{}]", node)).collect();
        let mut text = format!("Additional results from: {}", nodes.join(", "));
        if let (State::Warn | State::Crit, Some((warn, crit))) = (state, self.levels_additional_nodes_count) {
            text.push_str(&format!(
                " (count: {}, warn/crit at {}/{})",
                render::integer(count),
                render::integer(warn),
                render::integer(crit)
            ));
        }
        CheckResult::notice(state, text)
    }

    fn metrics(&self, node_results: &NodeResults, pivot: &NodeOutcome) -> Vec<CheckOutput> {
        let from_metrics_node = self.metrics_node.and_then(|metrics_node| {
            node_results
                .iter()
                .find(|(node, outcome)| node == metrics_node && !outcome.metrics.is_empty())
                .map(|(node, outcome)| (node.as_str(), &outcome.metrics))
        });

        let mut outputs = Vec::new();
        let metrics: &[Metric] = match from_metrics_node {
            Some((node, metrics)) => {
                let names: Vec<&str> = metrics.iter().map(|m| m.name.as_str()).collect();
                outputs.push(
                    CheckResult::notice(State::Ok, format!("[{}] Metrics: {}", node, names.join(", "))).into(),
                );
                metrics
            }
            None => &pivot.metrics,
        };
        outputs.extend(metrics.iter().cloned().map(CheckOutput::from));
        outputs
    }
}
