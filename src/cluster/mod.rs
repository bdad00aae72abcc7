//! Merging the outcomes of one check across the nodes of a cluster.
//!
//! In `native` mode the plugin's own cluster function gets all node sections
//! at once. The other modes run the plain check function once per node (in
//! node order) and let a summarizer pick the node whose results represent the
//! cluster.

mod executor;
mod summarizer;

pub use executor::*;
pub use summarizer::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{CheckResult, State};
use crate::checking::{CheckEnv, CheckOutcome, CheckPlugin, NodeSections};

/// How the results of the nodes are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterMode {
    Native,
    Worst,
    Best,
    Failover,
}

/// Per-service cluster parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Node that is used whenever it reports.
    pub primary_node: Option<String>,
    /// Node whose metrics are surfaced.
    pub metrics_node: Option<String>,
    /// (warn, crit) on the number of nodes reporting besides the selected one.
    pub levels_additional_nodes_count: Option<(f64, f64)>,
}

impl ClusterMode {
    fn label(self) -> &'static str {
        match self {
            ClusterMode::Native => "Native",
            ClusterMode::Worst => "Worst",
            ClusterMode::Best => "Best",
            ClusterMode::Failover => "Active",
        }
    }

    fn default_additional_nodes_levels(self) -> Option<(f64, f64)> {
        match self {
            ClusterMode::Failover => Some((1.0, 1.0)),
            ClusterMode::Best => Some((2.0, 2.0)),
            _ => None,
        }
    }
}

/// Run `plugin` for a clustered service.
///
/// Ignored nodes make the whole aggregation fail with a combined
/// [`IgnoreResultsError`](crate::api::IgnoreResultsError). Any other error of
/// a node's check function aborts the aggregation unchanged.
pub fn cluster_check(
    env: &mut CheckEnv<'_>,
    plugin: &CheckPlugin,
    mode: ClusterMode,
    params: &ClusterParams,
    item: Option<&str>,
    plugin_params: &Value,
    sections: &NodeSections,
) -> CheckOutcome {
    if mode == ClusterMode::Native {
        return match plugin.cluster_check() {
            Some(check) => check(&mut env.context(None), item, plugin_params, sections),
            None => Ok(vec![CheckResult::with_details(
                State::Unknown,
                "no cluster function",
                format!(
                    "Check plugin {} has no native cluster support; choose another cluster mode",
                    plugin.name()
                ),
            )
            .into()]),
        };
    }

    let node_results = execute_on_nodes(env, plugin, item, plugin_params, sections)?;
    let selector = NodeSelector::new(mode, params);
    Ok(selector.summarize(&node_results)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CheckError, CheckOutput, IgnoreResultsError, Metric};
    use crate::checking::ServiceCheckResult;
    use crate::prediction::NoPredictions;
    use crate::value_store::HostValueStore;
    use serde_json::json;

    /// Section format: {"state": code, "text": str, "metric": f64, "ignore": str, "crash": str}
    fn scripted_plugin() -> CheckPlugin {
        CheckPlugin::new("scripted", |_, _, _, section| {
            if section.is_null() {
                return Ok(Vec::new());
            }
            if let Some(reason) = section["ignore"].as_str() {
                return Err(IgnoreResultsError::new(reason).into());
            }
            if let Some(msg) = section["crash"].as_str() {
                return Err(CheckError::plugin(msg));
            }
            let state = State::from_code(section["state"].as_i64().unwrap_or(0)).unwrap_or(State::Unknown);
            let text = section["text"].as_str().unwrap_or("service").to_string();
            let mut outputs: Vec<CheckOutput> = vec![CheckResult::new(state, text).into()];
            if let Some(value) = section["metric"].as_f64() {
                outputs.push(Metric::new("load", value).into());
            }
            Ok(outputs)
        })
    }

    fn run(mode: ClusterMode, params: &ClusterParams, nodes: &[(&str, Value)]) -> CheckOutcome {
        run_plugin(&scripted_plugin(), mode, params, nodes)
    }

    fn run_plugin(
        plugin: &CheckPlugin,
        mode: ClusterMode,
        params: &ClusterParams,
        nodes: &[(&str, Value)],
    ) -> CheckOutcome {
        let mut store = HostValueStore::new("cluster");
        let mut env = CheckEnv::new("cluster", "Service", 1000.0, &mut store, &NoPredictions);
        let sections: NodeSections = nodes.iter().map(|(n, s)| (n.to_string(), s.clone())).collect();
        cluster_check(&mut env, plugin, mode, params, None, &json!({}), &sections)
    }

    fn results(outputs: &[CheckOutput]) -> Vec<&CheckResult> {
        outputs.iter().filter_map(CheckOutput::as_result).collect()
    }

    fn metrics(outputs: &[CheckOutput]) -> Vec<&Metric> {
        outputs.iter().filter_map(CheckOutput::as_metric).collect()
    }

    #[test]
    fn test_worst_selects_critical_node() {
        let outputs = run(
            ClusterMode::Worst,
            &ClusterParams::default(),
            &[("A", json!({"state": 2, "text": "down"})), ("B", json!({"state": 0, "text": "up"}))],
        )
        .unwrap();

        let results = results(&outputs);
        assert_eq!(results[0], &CheckResult::new(State::Ok, "Worst: [A]"));
        assert_eq!(results[1], &CheckResult::new(State::Crit, "down"));
        assert!(results[2..].iter().all(|r| r.is_notice() && r.state == State::Ok));
        assert_eq!(results.last().unwrap().details, "[B]: up");

        let service = ServiceCheckResult::from_outputs(outputs);
        assert_eq!(service.state, State::Crit);
    }

    #[test]
    fn test_worst_marks_non_ok_secondary() {
        let outputs = run(
            ClusterMode::Worst,
            &ClusterParams::default(),
            &[("A", json!({"state": 2})), ("B", json!({"state": 1}))],
        )
        .unwrap();

        let results = results(&outputs);
        assert_eq!(results[0].summary, "Worst: [A]");
        let secondary = results.last().unwrap();
        assert!(secondary.is_notice());
        assert_eq!(secondary.state, State::Ok);
        assert_eq!(secondary.details, "[B]: service(!)");
        assert!(results
            .iter()
            .filter(|r| r.state == State::Crit)
            .all(|r| r.summary == "service"));

        assert_eq!(ServiceCheckResult::from_outputs(outputs).state, State::Crit);
    }

    #[test]
    fn test_secondary_nodes_never_raise_state() {
        let outputs = run(
            ClusterMode::Best,
            &ClusterParams::default(),
            &[("A", json!({"state": 2, "text": "down"})), ("B", json!({"state": 0, "text": "up"}))],
        )
        .unwrap();

        let results = results(&outputs);
        assert_eq!(results[0].summary, "Best: [B]");
        assert_eq!(results.last().unwrap().details, "[A]: down(!!)");
        assert_eq!(ServiceCheckResult::from_outputs(outputs).state, State::Ok);
    }

    #[test]
    fn test_ties_go_to_first_node() {
        let outputs = run(
            ClusterMode::Worst,
            &ClusterParams::default(),
            &[("A", json!({"state": 1})), ("B", json!({"state": 1}))],
        )
        .unwrap();
        assert_eq!(results(&outputs)[0].summary, "Worst: [A]");
    }

    #[test]
    fn test_all_nodes_empty() {
        let outputs = run(
            ClusterMode::Worst,
            &ClusterParams::default(),
            &[("A", Value::Null), ("B", Value::Null)],
        )
        .unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_empty_node_is_dropped() {
        let outputs = run(
            ClusterMode::Failover,
            &ClusterParams::default(),
            &[("A", Value::Null), ("B", json!({"state": 0}))],
        )
        .unwrap();
        let results = results(&outputs);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].summary, "Active: [B]");
    }

    #[test]
    fn test_ignored_nodes_are_combined() {
        let err = run(
            ClusterMode::Worst,
            &ClusterParams::default(),
            &[("A", json!({"ignore": "x"})), ("B", json!({"ignore": "y"})), ("C", json!({"state": 0}))],
        )
        .unwrap_err();

        match err {
            CheckError::Ignore(e) => assert_eq!(e.0, "[A] x [B] y"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_error_propagates() {
        let err = run(
            ClusterMode::Best,
            &ClusterParams::default(),
            &[("A", json!({"state": 0})), ("B", json!({"crash": "index out of range"}))],
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::Plugin(msg) if msg == "index out of range"));
    }

    #[test]
    fn test_failover_split_brain_is_critical() {
        let outputs = run(
            ClusterMode::Failover,
            &ClusterParams::default(),
            &[("A", json!({"state": 0})), ("B", json!({"state": 0}))],
        )
        .unwrap();

        let additional = results(&outputs)
            .into_iter()
            .find(|r| r.details.starts_with("Additional results from"))
            .cloned()
            .unwrap();
        assert_eq!(additional.state, State::Crit);
        assert_eq!(
            additional.summary,
            "Additional results from: [B] (count: 1, warn/crit at 1/1)"
        );
        assert_eq!(ServiceCheckResult::from_outputs(outputs).state, State::Crit);
    }

    #[test]
    fn test_failover_single_active_node_is_ok() {
        let outputs = run(
            ClusterMode::Failover,
            &ClusterParams::default(),
            &[("A", Value::Null), ("B", json!({"state": 0, "text": "running"}))],
        )
        .unwrap();
        let service = ServiceCheckResult::from_outputs(outputs);
        assert_eq!(service.state, State::Ok);
        assert!(service.output.starts_with("Active: [B], running"));
    }

    #[test]
    fn test_primary_node_wins_regardless_of_state() {
        let params = ClusterParams {
            primary_node: Some("B".to_string()),
            ..Default::default()
        };
        let outputs = run(
            ClusterMode::Worst,
            &params,
            &[("A", json!({"state": 2})), ("B", json!({"state": 0}))],
        )
        .unwrap();
        let results = results(&outputs);
        assert_eq!(results[0], &CheckResult::new(State::Ok, "Worst: [B]"));
    }

    #[test]
    fn test_unpreferred_node_is_warning() {
        let params = ClusterParams {
            primary_node: Some("A".to_string()),
            ..Default::default()
        };
        let outputs = run(
            ClusterMode::Failover,
            &params,
            &[("A", Value::Null), ("B", json!({"state": 0, "text": "running"}))],
        )
        .unwrap();

        let header = results(&outputs)[0].clone();
        assert_eq!(header.state, State::Warn);
        assert_eq!(header.summary, "Active: [B]");
        assert_eq!(header.details, "Active: [B], preferred node is [A]");
        assert_eq!(ServiceCheckResult::from_outputs(outputs).state, State::Warn);
    }

    #[test]
    fn test_metrics_come_from_pivot() {
        let outputs = run(
            ClusterMode::Worst,
            &ClusterParams::default(),
            &[("A", json!({"state": 1, "metric": 1.0})), ("B", json!({"state": 0, "metric": 2.0}))],
        )
        .unwrap();
        assert_eq!(metrics(&outputs), vec![&Metric::new("load", 1.0)]);
    }

    #[test]
    fn test_metrics_node() {
        let params = ClusterParams {
            metrics_node: Some("B".to_string()),
            ..Default::default()
        };
        let outputs = run(
            ClusterMode::Worst,
            &params,
            &[("A", json!({"state": 1, "metric": 1.0})), ("B", json!({"state": 0, "metric": 2.0}))],
        )
        .unwrap();

        assert_eq!(metrics(&outputs), vec![&Metric::new("load", 2.0)]);
        assert!(results(&outputs)
            .iter()
            .any(|r| r.details == "[B] Metrics: load" && r.is_notice()));
    }

    #[test]
    fn test_native_delegates_to_cluster_function() {
        let plugin = scripted_plugin().with_cluster_check(|ctx, _, _, sections| {
            assert_eq!(ctx.node(), None);
            Ok(vec![CheckResult::new(State::Ok, format!("{} nodes", sections.len())).into()])
        });
        let outputs = run_plugin(
            &plugin,
            ClusterMode::Native,
            &ClusterParams::default(),
            &[("A", json!({})), ("B", json!({}))],
        )
        .unwrap();
        assert_eq!(results(&outputs), vec![&CheckResult::new(State::Ok, "2 nodes")]);
    }

    #[test]
    fn test_native_without_cluster_function() {
        let outputs = run(ClusterMode::Native, &ClusterParams::default(), &[("A", json!({}))]).unwrap();
        let results = results(&outputs);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].state, State::Unknown);
        assert_eq!(results[0].summary, "no cluster function");
    }

    #[test]
    fn test_counters_per_node() {
        let plugin = CheckPlugin::new("rate", |ctx, _, _, section| {
            let rate = ctx.get_rate("ctr", section["ctr"].as_f64().unwrap_or(0.0), true)?;
            Ok(vec![CheckResult::new(State::Ok, format!("{:.1}/s", rate)).into()])
        });
        let mut store = HostValueStore::new("cluster");
        let sections = |a: f64, b: f64| -> NodeSections {
            vec![("A".to_string(), json!({"ctr": a})), ("B".to_string(), json!({"ctr": b}))]
        };

        let mut env = CheckEnv::new("cluster", "Rate", 100.0, &mut store, &NoPredictions);
        let first = cluster_check(
            &mut env,
            &plugin,
            ClusterMode::Worst,
            &ClusterParams::default(),
            None,
            &Value::Null,
            &sections(0.0, 0.0),
        );
        assert!(matches!(first, Err(CheckError::Ignore(_))));

        let mut env = CheckEnv::new("cluster", "Rate", 110.0, &mut store, &NoPredictions);
        let second = cluster_check(
            &mut env,
            &plugin,
            ClusterMode::Worst,
            &ClusterParams::default(),
            None,
            &Value::Null,
            &sections(10.0, 100.0),
        )
        .unwrap();
        let results = results(&second);
        assert_eq!(results[1].summary, "1.0/s");
        assert_eq!(results.last().unwrap().details, "[B]: 10.0/s");
    }
}
