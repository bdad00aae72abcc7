//! Database model types.

use serde::{Deserialize, Serialize};

/// One persisted value-store entry of a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSample {
    pub service: String,
    /// Cluster node the entry belongs to, `None` for the service itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    pub key: String,
    pub time: f64,
    pub value: f64,
}

/// Value-store statistics of one host.
#[derive(Debug, Clone, Serialize)]
pub struct HostStoreStat {
    pub host: String,
    pub services: i64,
    pub entries: i64,
}
