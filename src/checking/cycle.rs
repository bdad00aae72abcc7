//! One host's check cycle: load the value store, run every service, write back.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use super::{CheckEnv, CheckRegistry, HostPlan, ServiceCheckResult, ServicePlan};
use crate::api::CheckError;
use crate::cluster::cluster_check;
use crate::levels::inject_prediction_location;
use crate::prediction::{prediction_dir_for, InjectedParameters, PredictionLookup};
use crate::value_store::{HostValueStore, ValueStoreError, ValueStoreManager};

/// Cycle error types.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("value store error: {0}")]
    ValueStore(#[from] ValueStoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub description: String,
    pub result: ServiceCheckResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub host: String,
    pub services: Vec<ServiceReport>,
}

/// Runs host cycles against a registry, value stores and prediction source.
#[derive(Clone)]
pub struct Checker {
    registry: Arc<CheckRegistry>,
    value_stores: ValueStoreManager,
    predictions: Arc<dyn PredictionLookup>,
    prediction_root: PathBuf,
}

impl Checker {
    pub fn new(
        registry: Arc<CheckRegistry>,
        value_stores: ValueStoreManager,
        predictions: Arc<dyn PredictionLookup>,
        prediction_root: PathBuf,
    ) -> Self {
        Self {
            registry,
            value_stores,
            predictions,
            prediction_root,
        }
    }

    /// Check all services of a host at time `now`.
    ///
    /// Services run one after another; the host's value store is loaded once
    /// before the first and written once after the last service.
    pub fn check_host(&self, plan: &HostPlan, now: f64) -> Result<HostReport, CycleError> {
        let mut store = self.value_stores.open(&plan.name)?;

        let services: Vec<ServiceReport> = plan
            .services
            .iter()
            .map(|service| ServiceReport {
                description: service.description.clone(),
                result: self.check_service(&mut store, &plan.name, service, now),
            })
            .collect();

        let written = store.commit()?;
        tracing::info!(
            "Checked {} services of {} (value store {})",
            services.len(),
            plan.name,
            if written { "saved" } else { "unchanged" }
        );

        Ok(HostReport {
            host: plan.name.clone(),
            services,
        })
    }

    fn check_service(
        &self,
        store: &mut HostValueStore,
        host: &str,
        service: &ServicePlan,
        now: f64,
    ) -> ServiceCheckResult {
        let Some(plugin) = self.registry.get(&service.plugin) else {
            tracing::warn!("{}/{}: unknown check plugin {}", host, service.description, service.plugin);
            return ServiceCheckResult::unknown(format!("Unknown check plugin {}", service.plugin));
        };

        let mut params = service.params.clone();
        inject_prediction_location(
            &mut params,
            &InjectedParameters {
                prediction_dir: prediction_dir_for(&self.prediction_root, host, &service.description),
            },
        );

        let item = service.item.as_deref();
        let mut env = CheckEnv::new(host, &service.description, now, store, self.predictions.as_ref());
        let outcome = match &service.cluster {
            None => plugin.check(&mut env.context(None), item, &params, &service.section),
            Some(cluster) => cluster_check(
                &mut env,
                plugin,
                cluster.mode,
                &cluster.params,
                item,
                &params,
                &cluster.node_sections(),
            ),
        };

        match outcome {
            Ok(outputs) => ServiceCheckResult::from_outputs(outputs),
            Err(CheckError::Ignore(e)) => {
                tracing::debug!("{}/{}: results ignored: {}", host, service.description, e);
                ServiceCheckResult::skipped(e.to_string())
            }
            Err(CheckError::Rate(e)) => {
                tracing::debug!("{}/{}: no rate yet: {}", host, service.description, e);
                ServiceCheckResult::skipped(e.to_string())
            }
            Err(CheckError::Levels(e)) => ServiceCheckResult::unknown(e.to_string()),
            Err(CheckError::Plugin(e)) => {
                tracing::error!("{}/{}: check plugin {} crashed: {}", host, service.description, plugin.name(), e);
                ServiceCheckResult::unknown(format!("Check plugin crashed: {}", e))
            }
        }
    }
}
