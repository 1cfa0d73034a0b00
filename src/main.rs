use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

mod checker;
mod config;
mod engine;
mod models;
mod notifier;
mod resolver;
mod store;

use crate::checker::HttpsChecker;
use crate::config::MonitorConfig;
use crate::engine::Monitor;
use crate::notifier::ApiNotifier;
use crate::resolver::CustomDnsResolver;
use crate::store::{FileLog, FileStatusStore, ReportLog};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config_content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path))?;
    let mut config: MonitorConfig =
        serde_json::from_str(&config_content).with_context(|| "Failed to parse config")?;
    config.apply_env_overrides();

    let log: Arc<dyn ReportLog> = Arc::new(FileLog::new(config.log_file.clone()));
    log.append("Monitor process started.");

    let resolver = Arc::new(CustomDnsResolver::new(
        &config.dns_servers,
        Duration::from_secs(config.dns_query_timeout_secs),
        Duration::from_secs(config.dns_lifetime_secs),
        Arc::clone(&log),
    ));
    let check_timeout = Duration::from_secs(config.check_timeout_secs);
    let checker = HttpsChecker::new(resolver.clone(), check_timeout, Arc::clone(&log))?;
    let notifier = ApiNotifier::new(
        resolver,
        config.email_api.clone(),
        config.push_api.clone(),
        check_timeout,
        Arc::clone(&log),
    )?;
    let status_store = Box::new(FileStatusStore::new(config.status_file.clone()));

    let monitor = Monitor::new(config, checker, notifier, status_store, log);
    tokio::spawn(async move {
        monitor.run().await;
    });

    signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping monitor...");

    Ok(())
}
