//! checkcore - runs check cycles from a cycle plan file.

use checkcore::checking::{CheckRegistry, Checker, HostReport};
use checkcore::config::{load_cycle_plan, EngineConfig};
use checkcore::db::Store;
use checkcore::prediction::PredictionStore;
use checkcore::scheduler::Scheduler;
use checkcore::value_store::ValueStoreManager;

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("checkcore=info".parse()?))
        .init();

    // Load configuration
    let cfg = EngineConfig::load();
    tracing::info!("Using database at {}", cfg.db_path);
    tracing::info!("Using predictions from {}", cfg.prediction_dir.display());

    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");
    for stat in store.get_host_stats()? {
        tracing::debug!("Value store of {}: {} services, {} entries", stat.host, stat.services, stat.entries);
    }

    let registry = CheckRegistry::with_builtin_plugins();
    tracing::info!("Check plugins: {}", registry.names().join(", "));

    let checker = Checker::new(
        Arc::new(registry),
        ValueStoreManager::new(store),
        Arc::new(PredictionStore::new()),
        cfg.prediction_dir.clone(),
    );
    let scheduler = Scheduler::new(checker, cfg.max_parallel_hosts)
        .with_jitter(Duration::from_millis(200));

    let plan = load_cycle_plan(&cfg.cycle_file)?;
    tracing::info!("Loaded cycle plan with {} hosts from {}", plan.hosts.len(), cfg.cycle_file.display());

    match cfg.interval {
        None => {
            for report in scheduler.run_once(&plan).await.into_iter().flatten() {
                print_report(&report);
            }
        }
        Some(period) => {
            let handle = scheduler.start(plan, period).await;
            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down...");
            scheduler.stop().await;
            handle.await?;
        }
    }

    Ok(())
}

fn print_report(report: &HostReport) {
    for service in &report.services {
        let result = &service.result;
        if !result.submit {
            println!("{}/{}: (skipped) {}", report.host, service.description, result.output);
            continue;
        }
        let perfdata: Vec<String> = result.metrics.iter().map(|m| m.perfdata()).collect();
        let output = result.output.replace('\n', "\\n");
        if perfdata.is_empty() {
            println!("{}/{}: {} - {}", report.host, service.description, result.state, output);
        } else {
            println!(
                "{}/{}: {} - {} | {}",
                report.host,
                service.description,
                result.state,
                output,
                perfdata.join(" ")
            );
        }
    }
}
