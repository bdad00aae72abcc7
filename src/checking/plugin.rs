//! The check function contract consumed from plugins.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::CheckContext;
use crate::api::{CheckError, CheckOutput};

/// Output stream of one check invocation.
pub type CheckOutcome = Result<Vec<CheckOutput>, CheckError>;

/// Sections of a clustered service, in node order.
pub type NodeSections = Vec<(String, Value)>;

/// `(context, item, params, section)` for a single host.
pub type CheckFunction =
    Arc<dyn Fn(&mut CheckContext<'_>, Option<&str>, &Value, &Value) -> CheckOutcome + Send + Sync>;

/// `(context, item, params, sections by node)` for plugins that aggregate clusters themselves.
pub type ClusterCheckFunction = Arc<
    dyn Fn(&mut CheckContext<'_>, Option<&str>, &Value, &NodeSections) -> CheckOutcome
        + Send
        + Sync,
>;

/// A named check plugin.
#[derive(Clone)]
pub struct CheckPlugin {
    name: String,
    check: CheckFunction,
    cluster_check: Option<ClusterCheckFunction>,
}

impl CheckPlugin {
    pub fn new<F>(name: &str, check: F) -> Self
    where
        F: Fn(&mut CheckContext<'_>, Option<&str>, &Value, &Value) -> CheckOutcome
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.to_string(),
            check: Arc::new(check),
            cluster_check: None,
        }
    }

    /// Add a native cluster check function.
    pub fn with_cluster_check<F>(mut self, cluster_check: F) -> Self
    where
        F: Fn(&mut CheckContext<'_>, Option<&str>, &Value, &NodeSections) -> CheckOutcome
            + Send
            + Sync
            + 'static,
    {
        self.cluster_check = Some(Arc::new(cluster_check));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(
        &self,
        ctx: &mut CheckContext<'_>,
        item: Option<&str>,
        params: &Value,
        section: &Value,
    ) -> CheckOutcome {
        (self.check)(ctx, item, params, section)
    }

    pub fn cluster_check(&self) -> Option<&ClusterCheckFunction> {
        self.cluster_check.as_ref()
    }
}

impl fmt::Debug for CheckPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckPlugin")
            .field("name", &self.name)
            .field("native_cluster", &self.cluster_check.is_some())
            .finish()
    }
}
