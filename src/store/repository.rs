use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::error::TrackerError;
use crate::models::Trade;

/// Change notification pushed to subscribers after every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChange {
    pub user_id: String,
    pub trade_id: Option<String>,
}

/// Per-user trade collection that mirrors the in-memory store.
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// All trades of a user, oldest entry first.
    async fn list(&self, user_id: &str) -> Result<Vec<Trade>, TrackerError>;

    /// Insert or overwrite a trade document.
    async fn upsert(&self, user_id: &str, trade: &Trade) -> Result<(), TrackerError>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), TrackerError>;

    /// Write back the last fetched market cap of a trade.
    async fn update_market_snapshot(
        &self,
        user_id: &str,
        id: &str,
        market_cap: f64,
        at: DateTime<Utc>,
    ) -> Result<(), TrackerError>;

    fn subscribe(&self) -> broadcast::Receiver<CollectionChange>;
}
