//! In-memory value store of one host and the rate/average helpers.

use std::collections::HashMap;
use std::sync::Arc;

use super::manager::HostLease;
use super::ValueStoreError;
use crate::api::GetRateError;
use crate::db::{Store, StoredSample};

/// A (timestamp, value) pair remembered from an earlier cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

/// A service, or one cluster node's share of a clustered service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Namespace {
    service: String,
    node: Option<String>,
}

struct Backing {
    store: Arc<Store>,
    _lease: HostLease,
}

/// The value store of a single host for the duration of one cycle.
pub struct HostValueStore {
    host: String,
    namespaces: HashMap<Namespace, HashMap<String, Sample>>,
    dirty: bool,
    backing: Option<Backing>,
}

impl HostValueStore {
    /// An empty store that is not backed by the database.
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            namespaces: HashMap::new(),
            dirty: false,
            backing: None,
        }
    }

    pub(crate) fn from_samples(host: &str, samples: Vec<StoredSample>) -> Self {
        let mut store = Self::new(host);
        for s in samples {
            let namespace = Namespace {
                service: s.service,
                node: s.node,
            };
            store.namespaces.entry(namespace).or_default().insert(
                s.key,
                Sample {
                    time: s.time,
                    value: s.value,
                },
            );
        }
        store
    }

    pub(crate) fn attach(&mut self, store: Arc<Store>, lease: HostLease) {
        self.backing = Some(Backing {
            store,
            _lease: lease,
        });
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether anything was written since the store was loaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mutable view restricted to one service, or one node of a clustered service.
    pub fn namespace(&mut self, service: &str, node: Option<&str>) -> ServiceValueStore<'_> {
        let namespace = Namespace {
            service: service.to_string(),
            node: node.map(str::to_string),
        };
        let entries = self.namespaces.entry(namespace).or_default();
        ServiceValueStore {
            entries,
            dirty: &mut self.dirty,
        }
    }

    /// Flat list of all entries, as persisted.
    pub fn to_samples(&self) -> Vec<StoredSample> {
        let mut samples: Vec<StoredSample> = self
            .namespaces
            .iter()
            .flat_map(|(namespace, entries)| {
                entries.iter().map(move |(key, s)| StoredSample {
                    service: namespace.service.clone(),
                    node: namespace.node.clone(),
                    key: key.clone(),
                    time: s.time,
                    value: s.value,
                })
            })
            .collect();
        samples.sort_by(|a, b| (&a.service, &a.node, &a.key).cmp(&(&b.service, &b.node, &b.key)));
        samples
    }

    /// Write the store back if it changed, then release the host.
    ///
    /// Returns whether anything was written.
    pub fn commit(self) -> Result<bool, ValueStoreError> {
        let Some(backing) = &self.backing else {
            return Ok(false);
        };
        if !self.dirty {
            tracing::debug!("Value store of {} unchanged, skipping write", self.host);
            return Ok(false);
        }

        let samples = self.to_samples();
        if samples.is_empty() {
            backing.store.delete_value_store(&self.host)?;
            tracing::debug!("Value store of {} emptied, deleted", self.host);
            return Ok(true);
        }
        backing.store.save_value_store(&self.host, &samples)?;
        tracing::debug!(
            "Saved value store of {} ({} entries)",
            self.host,
            samples.len()
        );
        Ok(true)
    }
}

/// View on the entries of one namespace inside a host store.
pub struct ServiceValueStore<'a> {
    entries: &'a mut HashMap<String, Sample>,
    dirty: &'a mut bool,
}

impl ServiceValueStore<'_> {
    pub fn get(&self, key: &str) -> Option<Sample> {
        self.entries.get(key).copied()
    }

    pub fn set(&mut self, key: &str, time: f64, value: f64) {
        self.entries.insert(key.to_string(), Sample { time, value });
        *self.dirty = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Sample> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            *self.dirty = true;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-second rate of a monotonically increasing counter.
    ///
    /// The first call for a key only remembers the sample and fails with
    /// [`GetRateError::Initialized`]. If the clock did not advance the stored
    /// sample is kept and 0 is returned. A counter that went backwards fails
    /// with [`GetRateError::Overflow`] when `raise_overflow` is set; otherwise
    /// the (negative) rate is returned. The new sample is stored in both cases.
    pub fn get_rate(
        &mut self,
        key: &str,
        now: f64,
        value: f64,
        raise_overflow: bool,
    ) -> Result<f64, GetRateError> {
        let Some(last) = self.get(key) else {
            self.set(key, now, value);
            return Err(GetRateError::Initialized(key.to_string()));
        };

        let time_diff = now - last.time;
        if time_diff <= 0.0 {
            return Ok(0.0);
        }

        self.set(key, now, value);
        if value < last.value && raise_overflow {
            return Err(GetRateError::Overflow(key.to_string()));
        }

        Ok((value - last.value) / time_diff)
    }

    /// Exponentially smoothed average of a value.
    ///
    /// The influence of the previous average halves every `backlog_minutes`.
    /// The first call seeds the average with `value`.
    pub fn get_average(&mut self, key: &str, now: f64, value: f64, backlog_minutes: f64) -> f64 {
        let Some(last) = self.get(key) else {
            self.set(key, now, value);
            return value;
        };

        let time_diff = now - last.time;
        if time_diff <= 0.0 {
            return last.value;
        }

        let backlog_seconds = backlog_minutes * 60.0;
        let average = if backlog_seconds > 0.0 {
            let weight = 0.5_f64.powf(time_diff / backlog_seconds);
            weight * last.value + (1.0 - weight) * value
        } else {
            value
        };

        self.set(key, now, average);
        average
    }
}
