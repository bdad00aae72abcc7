//! Running a plain check function once per cluster node.

use serde_json::Value;

use crate::api::{CheckError, CheckOutput, CheckResult, Metric};
use crate::checking::{CheckEnv, CheckPlugin, NodeSections};

/// What one node's check invocation produced, split by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOutcome {
    pub results: Vec<CheckResult>,
    pub metrics: Vec<Metric>,
    /// Reasons the node's results are to be ignored this cycle.
    pub ignores: Vec<String>,
}

impl NodeOutcome {
    fn from_outputs(outputs: Vec<CheckOutput>) -> Self {
        let mut outcome = Self::default();
        for output in outputs {
            match output {
                CheckOutput::Result(r) => outcome.results.push(r),
                CheckOutput::Metric(m) => outcome.metrics.push(m),
                CheckOutput::Ignore(i) => outcome.ignores.push(i.0),
            }
        }
        outcome
    }

    fn ignored(reason: String) -> Self {
        Self {
            ignores: vec![reason],
            ..Default::default()
        }
    }
}

/// Outcomes keyed by node, in node order.
pub type NodeResults = Vec<(String, NodeOutcome)>;

/// Evaluate `plugin` against every node's section.
///
/// An [`IgnoreResultsError`](crate::api::IgnoreResultsError) or a missing rate
/// marks the node as ignored. Any other error aborts and is returned as is.
pub fn execute_on_nodes(
    env: &mut CheckEnv<'_>,
    plugin: &CheckPlugin,
    item: Option<&str>,
    params: &Value,
    sections: &NodeSections,
) -> Result<NodeResults, CheckError> {
    let mut node_results = Vec::with_capacity(sections.len());

    for (node, section) in sections {
        let checked = plugin.check(&mut env.context(Some(node.as_str())), item, params, section);
        let outcome = match checked {
            Ok(outputs) => NodeOutcome::from_outputs(outputs),
            Err(CheckError::Ignore(e)) => NodeOutcome::ignored(e.0),
            Err(CheckError::Rate(e)) => NodeOutcome::ignored(e.to_string()),
            Err(e) => {
                tracing::debug!("{}: check on node {} failed: {}", env.service(), node, e);
                return Err(e);
            }
        };
        node_results.push((node.clone(), outcome));
    }

    Ok(node_results)
}
