pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod filters;
pub mod models;
pub mod render;
pub mod server;

use crate::config::AppSettings;
use crate::dashboard::Dashboard;
use crate::server::AppState;
use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn run() -> anyhow::Result<()> {
    let settings = AppSettings::from_env().context("reading dashboard settings")?;
    init_tracing(settings.log_dir.as_deref()).map_err(|error| anyhow::anyhow!("initializing tracing: {}", error))?;

    tracing::info!(
        db_path = %settings.db_path.display(),
        listen = %settings.listen,
        cache_ttl_secs = settings.cache_ttl.as_secs(),
        "starting pagespeed dashboard"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("pagespeed-dashboard")
        .build()
        .context("building async runtime")?;

    let state = AppState::new(Dashboard::new(&settings));
    runtime
        .block_on(server::serve(settings.listen, state))
        .context("serving dashboard")?;
    Ok(())
}

fn init_tracing(log_dir: Option<&Path>) -> Result<(), String> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "dashboard.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);

            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .json()
                .with_writer(non_blocking)
                .try_init()
                .map_err(|error| error.to_string())
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .try_init()
            .map_err(|error| error.to_string()),
    }
}
