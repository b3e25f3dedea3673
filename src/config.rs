use std::path::PathBuf;
use std::time::Duration;

use crate::api::helius::DEFAULT_RPC_URL;
use crate::api::RateLimitConfig;

const APP_DIR_NAME: &str = "trades-tracker";
const DB_FILE: &str = "trades_tracker.db";

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub rpc_url: String,
    pub api_key: Option<String>,
    pub min_request_interval: Duration,
    pub rate_limit_backoff: Duration,
    pub refresh_group_pause: Duration,
}

impl AppConfig {
    /// Reads:
    /// - `TRADES_TRACKER_DATA_DIR` (default: platform data dir + `trades-tracker`)
    /// - `HELIUS_RPC_URL`, `HELIUS_API_KEY`
    /// - `MARKET_DATA_MIN_INTERVAL_MS`, `MARKET_DATA_BACKOFF_MS`, `REFRESH_GROUP_PAUSE_MS`
    pub fn from_env() -> Self {
        let data_dir = std::env::var("TRADES_TRACKER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Self {
            data_dir,
            rpc_url: std::env::var("HELIUS_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            api_key: std::env::var("HELIUS_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            min_request_interval: env_millis("MARKET_DATA_MIN_INTERVAL_MS", 1100),
            rate_limit_backoff: env_millis("MARKET_DATA_BACKOFF_MS", 2000),
            refresh_group_pause: env_millis("REFRESH_GROUP_PAUSE_MS", 1000),
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            min_interval: self.min_request_interval,
            rate_limit_backoff: self.rate_limit_backoff,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn env_millis(name: &str, default: u64) -> Duration {
    let millis = match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using {}ms", name, raw, default);
            default
        }),
        Err(_) => default,
    };
    Duration::from_millis(millis)
}
