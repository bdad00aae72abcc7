//! Hands out host value stores, one cycle per host at a time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::{HostValueStore, ValueStoreError};
use crate::db::Store;

/// Loads and leases host value stores.
#[derive(Clone)]
pub struct ValueStoreManager {
    store: Arc<Store>,
    leased: Arc<Mutex<HashSet<String>>>,
}

impl ValueStoreManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            leased: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Lease and load the value store of a host.
    ///
    /// Fails with [`ValueStoreError::HostBusy`] while another cycle holds the
    /// same host. The lease ends when the returned store is committed or dropped.
    pub fn open(&self, host: &str) -> Result<HostValueStore, ValueStoreError> {
        let lease = HostLease::acquire(self.leased.clone(), host)?;
        let samples = self.store.load_value_store(host)?;
        tracing::debug!("Loaded value store of {} ({} entries)", host, samples.len());

        let mut host_store = HostValueStore::from_samples(host, samples);
        host_store.attach(self.store.clone(), lease);
        Ok(host_store)
    }

    pub fn is_leased(&self, host: &str) -> bool {
        self.leased
            .lock()
            .map(|set| set.contains(host))
            .unwrap_or(false)
    }
}

/// Exclusive claim on one host's value store.
pub(crate) struct HostLease {
    host: String,
    leased: Arc<Mutex<HashSet<String>>>,
}

impl HostLease {
    fn acquire(leased: Arc<Mutex<HashSet<String>>>, host: &str) -> Result<Self, ValueStoreError> {
        {
            let mut set = leased.lock().map_err(|_| ValueStoreError::Poisoned)?;
            if !set.insert(host.to_string()) {
                return Err(ValueStoreError::HostBusy(host.to_string()));
            }
        }
        Ok(Self {
            host: host.to_string(),
            leased,
        })
    }
}

impl Drop for HostLease {
    fn drop(&mut self) {
        if let Ok(mut set) = self.leased.lock() {
            set.remove(&self.host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_commit_reload() {
        let manager = ValueStoreManager::new(Arc::new(Store::in_memory().unwrap()));

        let mut host = manager.open("web1").unwrap();
        let _ = host.namespace("Interface 1", None).get_rate("in", 100.0, 1000.0, true);
        assert!(host.commit().unwrap());

        let mut host = manager.open("web1").unwrap();
        let rate = host
            .namespace("Interface 1", None)
            .get_rate("in", 200.0, 3000.0, true)
            .unwrap();
        assert_eq!(rate, 20.0);
    }

    #[test]
    fn test_one_cycle_per_host() {
        let manager = ValueStoreManager::new(Arc::new(Store::in_memory().unwrap()));

        let first = manager.open("web1").unwrap();
        assert!(matches!(
            manager.open("web1"),
            Err(ValueStoreError::HostBusy(h)) if h == "web1"
        ));
        // other hosts are independent
        let other = manager.open("web2").unwrap();
        assert!(manager.is_leased("web1"));

        drop(first);
        assert!(!manager.is_leased("web1"));
        assert!(manager.open("web1").is_ok());
        drop(other);
    }

    #[test]
    fn test_emptied_store_is_deleted() {
        let db = Arc::new(Store::in_memory().unwrap());
        let manager = ValueStoreManager::new(db.clone());

        let mut host = manager.open("web1").unwrap();
        host.namespace("Uptime", None).set("boot", 1.0, 100.0);
        assert!(host.commit().unwrap());
        assert_eq!(db.get_host_stats().unwrap().len(), 1);

        let mut host = manager.open("web1").unwrap();
        assert_eq!(host.namespace("Uptime", None).remove("boot").map(|s| s.value), Some(100.0));
        assert!(host.commit().unwrap());
        assert!(db.load_value_store("web1").unwrap().is_empty());
        assert!(db.get_host_stats().unwrap().is_empty());
    }

    #[test]
    fn test_unchanged_store_is_not_written() {
        let manager = ValueStoreManager::new(Arc::new(Store::in_memory().unwrap()));
        let host = manager.open("idle").unwrap();
        assert!(!host.commit().unwrap());
    }
}
