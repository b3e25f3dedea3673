//! Shared fixtures for command tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{Notify, broadcast};

use crate::api::{ApiError, MarketDataClient, MarketSnapshot};
use crate::config::AppConfig;
use crate::db::{Database, SqliteTradeRepository};
use crate::error::TrackerError;
use crate::models::{TokenMetadata, Trade, UpdateSettingsInput};
use crate::state::AppState;
use crate::store::{CollectionChange, TradeRepository};

pub const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

/// Market data with a fixed SOL price of 100 and per-address market caps.
///
/// After `hold_snapshots`, each snapshot fetch signals `snapshot_started`
/// and waits for `release_snapshots`.
#[derive(Default)]
pub struct FakeMarket {
    pub market_caps: Mutex<HashMap<String, f64>>,
    pub snapshot_started: Notify,
    held: AtomicBool,
    release: Notify,
}

impl FakeMarket {
    pub fn set_market_cap(&self, address: &str, market_cap: f64) {
        self.market_caps
            .lock()
            .unwrap()
            .insert(address.to_string(), market_cap);
    }

    pub fn hold_snapshots(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_snapshots(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }
}

#[async_trait]
impl MarketDataClient for FakeMarket {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn fetch_token_metadata(&self, address: &str) -> Result<TokenMetadata, ApiError> {
        if !crate::api::is_valid_token_address(address) {
            return Err(ApiError::InvalidAddress(address.to_string()));
        }
        Ok(TokenMetadata {
            symbol: "FAKE".to_string(),
            name: "Fake Token".to_string(),
            ..TokenMetadata::placeholder(address)
        })
    }

    async fn fetch_reference_price(&self) -> Result<Option<f64>, ApiError> {
        Ok(Some(100.0))
    }

    async fn fetch_market_snapshot(&self, address: &str) -> Result<Option<MarketSnapshot>, ApiError> {
        if self.held.load(Ordering::SeqCst) {
            self.snapshot_started.notify_one();
            self.release.notified().await;
        }
        let market_cap = self.market_caps.lock().unwrap().get(address).copied();
        Ok(market_cap.map(|current_market_cap| MarketSnapshot {
            address: address.to_string(),
            current_market_cap,
        }))
    }
}

/// Collection whose writes always fail.
pub struct FailingRepository {
    changes: broadcast::Sender<CollectionChange>,
}

impl FailingRepository {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(4);
        Self { changes }
    }
}

#[async_trait]
impl TradeRepository for FailingRepository {
    async fn list(&self, _user_id: &str) -> Result<Vec<Trade>, TrackerError> {
        Ok(Vec::new())
    }

    async fn upsert(&self, _user_id: &str, _trade: &Trade) -> Result<(), TrackerError> {
        Err(TrackerError::Remote("connection refused".to_string()))
    }

    async fn delete(&self, _user_id: &str, _id: &str) -> Result<(), TrackerError> {
        Err(TrackerError::Remote("connection refused".to_string()))
    }

    async fn update_market_snapshot(
        &self,
        _user_id: &str,
        _id: &str,
        _market_cap: f64,
        _at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        Err(TrackerError::Remote("connection refused".to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.changes.subscribe()
    }
}

fn config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::from_env().with_data_dir(dir.path().to_path_buf());
    config.api_key = None;
    config.min_request_interval = Duration::ZERO;
    config.rate_limit_backoff = Duration::ZERO;
    config.refresh_group_pause = Duration::ZERO;
    config
}

fn build_state(repository: Option<Arc<dyn TradeRepository>>) -> (AppState, TempDir, Arc<FakeMarket>) {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open_in_memory().unwrap());
    let repository =
        repository.unwrap_or_else(|| Arc::new(SqliteTradeRepository::new(db.clone())));
    let market = Arc::new(FakeMarket::default());

    let state = AppState::from_parts(config(&dir), db, repository, market.clone());
    (state, dir, market)
}

/// Fresh state in test mode (the default).
pub fn demo_state() -> (AppState, TempDir) {
    let (state, dir, _) = build_state(None);
    (state, dir)
}

pub fn demo_state_with_market() -> (AppState, TempDir, Arc<FakeMarket>) {
    build_state(None)
}

async fn go_live(state: &AppState, user: Option<&str>) {
    crate::commands::update_settings(
        state,
        UpdateSettingsInput {
            test_mode: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    if let Some(user) = user {
        crate::commands::login(state, user).await.unwrap();
    }
}

/// Live mode backed by the SQLite collection, optionally signed in.
pub async fn remote_state(user: Option<&str>) -> (AppState, TempDir) {
    let (state, dir, _) = build_state(None);
    go_live(&state, user).await;
    (state, dir)
}

pub async fn remote_state_with_market(user: &str) -> (AppState, TempDir, Arc<FakeMarket>) {
    let (state, dir, market) = build_state(None);
    go_live(&state, Some(user)).await;
    (state, dir, market)
}

/// Live mode where every remote write fails.
pub async fn failing_remote_state(user: &str) -> (AppState, TempDir) {
    let (state, dir, _) = build_state(Some(Arc::new(FailingRepository::new())));
    go_live(&state, Some(user)).await;
    (state, dir)
}
