//! Scheduler module for running host check cycles.
//!
//! Every host is checked synchronously on the blocking pool; hosts run in
//! parallel up to a configured bound.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::checking::{Checker, CycleError, CyclePlan, HostPlan, HostReport};

/// Scheduler error types.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("check cycle of {host} failed: {source}")]
    Cycle { host: String, source: CycleError },
    #[error("check cycle of {host} aborted: {reason}")]
    Aborted { host: String, reason: String },
}

/// Runs the hosts of a cycle plan, once or periodically.
#[derive(Clone)]
pub struct Scheduler {
    checker: Checker,
    semaphore: Arc<Semaphore>,
    max_jitter: Duration,
    stop: Arc<Mutex<Option<broadcast::Sender<()>>>>,
}

impl Scheduler {
    pub fn new(checker: Checker, max_parallel_hosts: usize) -> Self {
        Self {
            checker,
            semaphore: Arc::new(Semaphore::new(max_parallel_hosts.max(1))),
            max_jitter: Duration::ZERO,
            stop: Arc::new(Mutex::new(None)),
        }
    }

    /// Delay each host's start by a random amount up to `max_jitter`.
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    /// Check every host of the plan once. Results are in plan order.
    pub async fn run_once(&self, plan: &CyclePlan) -> Vec<Result<HostReport, SchedulerError>> {
        let handles: Vec<JoinHandle<Result<HostReport, SchedulerError>>> = plan
            .hosts
            .iter()
            .cloned()
            .map(|host| {
                let checker = self.checker.clone();
                let semaphore = self.semaphore.clone();
                let jitter = self.jitter();
                tokio::spawn(run_host(checker, semaphore, jitter, host))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, host) in handles.into_iter().zip(&plan.hosts) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SchedulerError::Aborted {
                    host: host.name.clone(),
                    reason: e.to_string(),
                }),
            };
            if let Err(e) = &result {
                tracing::error!("Scheduler: {}", e);
            }
            results.push(result);
        }

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!("Scheduler: checked {} hosts ({} failed)", results.len(), failed);
        results
    }

    /// Check the plan every `period` until [`Scheduler::stop`] is called.
    pub async fn start(&self, plan: CyclePlan, period: Duration) -> JoinHandle<()> {
        let (tx, _) = broadcast::channel(1);
        let mut rx = tx.subscribe();
        {
            let mut stop_guard = self.stop.lock().await;
            *stop_guard = Some(tx);
        }

        tracing::info!(
            "Starting scheduler with {} hosts every {:?}",
            plan.hosts.len(),
            period
        );

        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = rx.recv() => break,
                    _ = interval.tick() => {
                        scheduler.run_once(&plan).await;
                    }
                }
            }
            tracing::info!("Scheduler stopped");
        })
    }

    /// Stop the periodic loop.
    pub async fn stop(&self) {
        let stop = self.stop.lock().await;
        if let Some(tx) = stop.as_ref() {
            let _ = tx.send(());
        }
    }
}

async fn run_host(
    checker: Checker,
    semaphore: Arc<Semaphore>,
    jitter: Duration,
    host: HostPlan,
) -> Result<HostReport, SchedulerError> {
    if !jitter.is_zero() {
        tokio::time::sleep(jitter).await;
    }

    let name = host.name.clone();
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| SchedulerError::Aborted {
            host: name.clone(),
            reason: e.to_string(),
        })?;

    let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    let joined = tokio::task::spawn_blocking(move || checker.check_host(&host, now)).await;
    match joined {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(source)) => Err(SchedulerError::Cycle { host: name, source }),
        Err(e) => Err(SchedulerError::Aborted {
            host: name,
            reason: e.to_string(),
        }),
    }
}
