use crate::errors::{AppError, AppResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "PAGESPEED_DB_PATH";
pub const ENV_LISTEN: &str = "PAGESPEED_LISTEN";
pub const ENV_LOG_DIR: &str = "PAGESPEED_LOG_DIR";

pub const DEFAULT_DB_PATH: &str = "pagespeed.db";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8501";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub db_path: PathBuf,
    pub listen: SocketAddr,
    pub log_dir: Option<PathBuf>,
    pub cache_ttl: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            listen: SocketAddr::from(([127, 0, 0, 1], 8501)),
            log_dir: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl AppSettings {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let listen_raw = read(ENV_LISTEN).unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen_raw.parse::<SocketAddr>().map_err(|err| {
            AppError::Config(format!("{} must be a socket address, got {:?}: {}", ENV_LISTEN, listen_raw, err))
        })?;

        Ok(Self {
            db_path,
            listen,
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        })
    }
}
