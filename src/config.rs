//! Configuration of the checking engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::checking::CyclePlan;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read cycle plan {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid cycle plan {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the SQLite value store database (default: "checkcore.db")
    pub db_path: String,
    /// Root directory of precomputed prediction baselines (default: "predictions")
    pub prediction_dir: PathBuf,
    /// Hosts checked at the same time (default: 8)
    pub max_parallel_hosts: usize,
    /// Cycle plan to run (default: "cycle.json")
    pub cycle_file: PathBuf,
    /// Run the plan periodically at this interval; once if unset.
    pub interval: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: "checkcore.db".to_string(),
            prediction_dir: PathBuf::from("predictions"),
            max_parallel_hosts: 8,
            cycle_file: PathBuf::from("cycle.json"),
            interval: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CHECKCORE_DB_PATH`: database file path (default: "checkcore.db")
    /// - `CHECKCORE_PREDICTION_DIR`: prediction baseline root (default: "predictions")
    /// - `CHECKCORE_MAX_PARALLEL_HOSTS`: concurrency bound (default: 8)
    /// - `CHECKCORE_CYCLE_FILE`: cycle plan file (default: "cycle.json")
    /// - `CHECKCORE_INTERVAL_SECS`: check interval in seconds (default: run once)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(db_path) = lookup("CHECKCORE_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Some(dir) = lookup("CHECKCORE_PREDICTION_DIR") {
            cfg.prediction_dir = PathBuf::from(dir);
        }

        if let Some(max_str) = lookup("CHECKCORE_MAX_PARALLEL_HOSTS") {
            if let Ok(max) = max_str.parse::<usize>() {
                if max > 0 {
                    cfg.max_parallel_hosts = max;
                }
            }
        }

        if let Some(file) = lookup("CHECKCORE_CYCLE_FILE") {
            cfg.cycle_file = PathBuf::from(file);
        }

        if let Some(secs_str) = lookup("CHECKCORE_INTERVAL_SECS") {
            if let Ok(secs) = secs_str.parse::<u64>() {
                if secs > 0 {
                    cfg.interval = Some(Duration::from_secs(secs));
                }
            }
        }

        cfg
    }
}

/// Read a cycle plan from a JSON file.
pub fn load_cycle_plan(path: &Path) -> Result<CyclePlan, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.db_path, "checkcore.db");
        assert_eq!(cfg.max_parallel_hosts, 8);
        assert_eq!(cfg.interval, None);
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let vars: HashMap<&str, &str> = [
            ("CHECKCORE_DB_PATH", "/var/lib/checkcore/values.db"),
            ("CHECKCORE_MAX_PARALLEL_HOSTS", "zero"),
            ("CHECKCORE_INTERVAL_SECS", "60"),
        ]
        .into_iter()
        .collect();
        let cfg = EngineConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.db_path, "/var/lib/checkcore/values.db");
        assert_eq!(cfg.max_parallel_hosts, 8);
        assert_eq!(cfg.interval, Some(Duration::from_secs(60)));
        assert_eq!(cfg.cycle_file, PathBuf::from("cycle.json"));
    }

    #[test]
    fn test_load_cycle_plan() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cycle.json");
        fs::write(&path, r#"{"hosts": [{"name": "web1"}]}"#).unwrap();

        let plan = load_cycle_plan(&path).unwrap();
        assert_eq!(plan.hosts[0].name, "web1");
        assert!(plan.hosts[0].services.is_empty());

        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_cycle_plan(&path), Err(ConfigError::Json { .. })));
        assert!(matches!(
            load_cycle_plan(&tmp.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
