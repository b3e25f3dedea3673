use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

use super::error::ApiError;
use crate::models::TokenMetadata;

static TOKEN_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("token address pattern is valid")
});

/// Base58 mint address check; says nothing about whether the mint exists.
pub fn is_valid_token_address(address: &str) -> bool {
    TOKEN_ADDRESS.is_match(address)
}

/// Pacing rules for a market-data provider
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Minimum gap between two outgoing calls
    pub min_interval: Duration,
    /// Pause taken once after the provider answers 429
    pub rate_limit_backoff: Duration,
}

/// Current market state of a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub address: String,
    pub current_market_cap: f64,
}

/// Source of token metadata and prices
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Provider name (e.g., "helius")
    fn provider_name(&self) -> &str;

    /// Resolve name/symbol/supply. Valid addresses the provider does not
    /// know resolve to placeholder metadata; malformed addresses fail with
    /// `ApiError::InvalidAddress`.
    async fn fetch_token_metadata(&self, address: &str) -> Result<TokenMetadata, ApiError>;

    /// SOL price in USD, `None` when the provider has no price.
    async fn fetch_reference_price(&self) -> Result<Option<f64>, ApiError>;

    /// Reference price then token price/supply. `None` when any field is
    /// missing or the provider rate-limited us.
    async fn fetch_market_snapshot(&self, address: &str) -> Result<Option<MarketSnapshot>, ApiError>;
}
