//! What a check function sees of the engine while it runs.

use crate::api::GetRateError;
use crate::levels::CheckLevels;
use crate::prediction::PredictionLookup;
use crate::value_store::{HostValueStore, ServiceValueStore};

/// Everything needed to invoke the check functions of one service.
pub struct CheckEnv<'a> {
    host: &'a str,
    service: &'a str,
    now: f64,
    store: &'a mut HostValueStore,
    predictions: &'a dyn PredictionLookup,
}

impl<'a> CheckEnv<'a> {
    pub fn new(
        host: &'a str,
        service: &'a str,
        now: f64,
        store: &'a mut HostValueStore,
        predictions: &'a dyn PredictionLookup,
    ) -> Self {
        Self {
            host,
            service,
            now,
            store,
            predictions,
        }
    }

    pub fn host(&self) -> &str {
        self.host
    }

    pub fn service(&self) -> &str {
        self.service
    }

    /// Context for the service itself (`node = None`) or one node of a clustered service.
    ///
    /// Every node gets its own value-store namespace inside the host store.
    pub fn context<'c>(&'c mut self, node: Option<&'c str>) -> CheckContext<'c> {
        CheckContext {
            host: self.host,
            service: self.service,
            node,
            now: self.now,
            value_store: self.store.namespace(self.service, node),
            predictions: self.predictions,
        }
    }
}

/// Per-invocation view handed to a check function.
pub struct CheckContext<'c> {
    host: &'c str,
    service: &'c str,
    node: Option<&'c str>,
    now: f64,
    value_store: ServiceValueStore<'c>,
    predictions: &'c dyn PredictionLookup,
}

impl<'c> CheckContext<'c> {
    pub fn host(&self) -> &str {
        self.host
    }

    pub fn service(&self) -> &str {
        self.service
    }

    /// The cluster node being checked, if any.
    pub fn node(&self) -> Option<&str> {
        self.node
    }

    /// Timestamp of the current cycle.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn value_store(&mut self) -> &mut ServiceValueStore<'c> {
        &mut self.value_store
    }

    pub fn get_rate(&mut self, key: &str, value: f64, raise_overflow: bool) -> Result<f64, GetRateError> {
        self.value_store.get_rate(key, self.now, value, raise_overflow)
    }

    pub fn get_average(&mut self, key: &str, value: f64, backlog_minutes: f64) -> f64 {
        self.value_store.get_average(key, self.now, value, backlog_minutes)
    }

    /// Start a level check that can resolve predictive levels.
    pub fn check_levels(&self, value: f64) -> CheckLevels<'c> {
        CheckLevels::new(value).predictions(self.predictions)
    }
}
