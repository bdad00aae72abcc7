//! What to check in one cycle, as handed over by the scheduler's caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NodeSections;
use crate::cluster::{ClusterMode, ClusterParams};

/// All hosts to check in one cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CyclePlan {
    pub hosts: Vec<HostPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostPlan {
    pub name: String,
    #[serde(default)]
    pub services: Vec<ServicePlan>,
}

/// One service: which plugin to run with which parameters on which data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePlan {
    pub description: String,
    pub plugin: String,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub params: Value,
    /// Parsed section of a regular host.
    #[serde(default)]
    pub section: Value,
    /// Set for services of cluster hosts.
    #[serde(default)]
    pub cluster: Option<ClusterPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterPlan {
    pub mode: ClusterMode,
    #[serde(default)]
    pub params: ClusterParams,
    /// Node sections in node order.
    pub nodes: Vec<NodeSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    pub node: String,
    #[serde(default)]
    pub section: Value,
}

impl ClusterPlan {
    pub fn node_sections(&self) -> NodeSections {
        self.nodes
            .iter()
            .map(|n| (n.node.clone(), n.section.clone()))
            .collect()
    }
}
