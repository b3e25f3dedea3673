use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::secure_storage::MARKET_DATA_API_KEY;
use crate::api::{HeliusClient, MarketDataClient, RateLimiter, SecureStorage};
use crate::config::AppConfig;
use crate::db::{Database, SqliteTradeRepository};
use crate::local_storage::LocalStorage;
use crate::models::UnrealizedPnLEntry;
use crate::pnl::unrealized_entry;
use crate::store::{TradeRepository, TradeStore};

/// Which collection the tracker currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeSource {
    /// Ephemeral sample data (test mode)
    Demo,
    /// The signed-in user's persisted collection
    Remote { user_id: String },
}

impl TradeSource {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            TradeSource::Demo => None,
            TradeSource::Remote { user_id } => Some(user_id),
        }
    }
}

/// Mutable tracker state; one lock guards all of it.
#[derive(Debug, Default)]
pub struct TrackerState {
    /// `None` until the first load
    pub source: Option<TradeSource>,
    pub store: TradeStore,
    pub unrealized: HashMap<String, UnrealizedPnLEntry>,
}

impl TrackerState {
    fn reprice(&self, entry: &UnrealizedPnLEntry) -> Option<UnrealizedPnLEntry> {
        let trade = self.store.get(&entry.trade_id)?;
        unrealized_entry(trade, entry.current_market_cap, entry.updated_at)
    }

    /// Price the trade as it is now at the entry's market cap and cache the
    /// result. Returns `None`, dropping any cached entry, when the trade is
    /// gone or no longer open.
    pub fn apply_market_cap(&mut self, entry: &UnrealizedPnLEntry) -> Option<UnrealizedPnLEntry> {
        let Some(fresh) = self.reprice(entry) else {
            self.unrealized.remove(&entry.trade_id);
            return None;
        };

        self.store
            .record_market_snapshot(&fresh.trade_id, fresh.current_market_cap, fresh.updated_at);
        self.unrealized.insert(fresh.trade_id.clone(), fresh.clone());
        Some(fresh)
    }

    /// Recompute every cached entry against the trades currently held.
    pub fn reprice_unrealized(&mut self) {
        let cached: Vec<UnrealizedPnLEntry> = self.unrealized.values().cloned().collect();
        for entry in cached {
            match self.reprice(&entry) {
                Some(fresh) => {
                    self.unrealized.insert(fresh.trade_id.clone(), fresh);
                }
                None => {
                    self.unrealized.remove(&entry.trade_id);
                }
            }
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<Database>,
    pub repository: Arc<dyn TradeRepository>,
    pub market: Arc<dyn MarketDataClient>,
    pub local_storage: LocalStorage,
    pub tracker: Mutex<TrackerState>,
}

impl AppState {
    pub fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.data_dir.display())
        })?;

        let db_path = config.db_path();
        log::info!("Database path: {:?}", db_path);

        let db_path_str = db_path
            .to_str()
            .context("Database path is not valid UTF-8")?;
        let database = Database::new(db_path_str).with_context(|| {
            format!(
                "Database initialization failed. Backups are in {}",
                config.data_dir.join("backups").display()
            )
        })?;
        let db = Arc::new(database);

        let api_key = match &config.api_key {
            Some(key) => Some(key.clone()),
            None => SecureStorage::new(&config.data_dir)
                .and_then(|storage| storage.retrieve(MARKET_DATA_API_KEY))
                .unwrap_or_else(|e| {
                    log::warn!("Could not read stored API key: {}", e);
                    None
                }),
        };
        if api_key.is_none() {
            log::warn!("No market data API key configured; lookups will use placeholders");
        }

        let rate_limit = config.rate_limit();
        let rate_limiter = Arc::new(RateLimiter::new(&rate_limit));
        let market: Arc<dyn MarketDataClient> = Arc::new(HeliusClient::new(
            config.rpc_url.clone(),
            api_key,
            rate_limiter,
            rate_limit,
        ));

        let repository: Arc<dyn TradeRepository> = Arc::new(SqliteTradeRepository::new(db.clone()));

        Ok(Self::from_parts(config, db, repository, market))
    }

    pub fn from_parts(
        config: AppConfig,
        db: Arc<Database>,
        repository: Arc<dyn TradeRepository>,
        market: Arc<dyn MarketDataClient>,
    ) -> Self {
        let local_storage = LocalStorage::new(&config.data_dir);
        Self {
            config,
            db,
            repository,
            market,
            local_storage,
            tracker: Mutex::new(TrackerState::default()),
        }
    }
}
