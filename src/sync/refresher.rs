use std::sync::Arc;
use std::time::Duration;

use crate::api::MarketDataClient;
use crate::models::{Trade, UnrealizedPnLEntry, now_millis};
use crate::pnl::unrealized_entry;

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Trades fetched back to back before pausing
    pub batch_size: usize,
    /// Pause between two groups
    pub group_pause: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            group_pause: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RefreshOutcome {
    pub entries: Vec<UnrealizedPnLEntry>,
    /// Trade ids with no usable market data this round
    pub skipped: Vec<String>,
}

/// Recomputes unrealized P/L for open trades from fresh market caps.
pub struct UnrealizedRefresher {
    market: Arc<dyn MarketDataClient>,
    config: RefreshConfig,
}

impl UnrealizedRefresher {
    pub fn new(market: Arc<dyn MarketDataClient>, config: RefreshConfig) -> Self {
        Self { market, config }
    }

    /// Fetch in groups of `batch_size`, one call at a time inside a group.
    ///
    /// Failures never abort the round; the trade is skipped.
    pub async fn refresh(&self, trades: &[Trade]) -> RefreshOutcome {
        let open: Vec<&Trade> = trades
            .iter()
            .filter(|t| t.is_open() && t.token_address.is_some())
            .collect();

        let mut outcome = RefreshOutcome::default();
        let batch_size = self.config.batch_size.max(1);

        for (index, group) in open.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.group_pause).await;
            }

            for trade in group {
                match self.refresh_one(trade).await {
                    Some(entry) => outcome.entries.push(entry),
                    None => outcome.skipped.push(trade.id.clone()),
                }
            }
        }

        log::info!(
            "Unrealized P/L refresh: {} updated, {} skipped",
            outcome.entries.len(),
            outcome.skipped.len()
        );

        outcome
    }

    async fn refresh_one(&self, trade: &Trade) -> Option<UnrealizedPnLEntry> {
        let address = trade.token_address.as_deref()?;

        let snapshot = match self.market.fetch_market_snapshot(address).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log::debug!("No market data for {} ({})", trade.ticker, address);
                return None;
            }
            Err(e) => {
                log::warn!("Market data fetch failed for {} ({}): {}", trade.ticker, address, e);
                return None;
            }
        };

        unrealized_entry(trade, snapshot.current_market_cap, now_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MarketSnapshot};
    use crate::models::{TokenMetadata, TradeStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves fixed market caps and records call order.
    struct FakeMarket {
        market_caps: HashMap<String, Option<f64>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MarketDataClient for FakeMarket {
        fn provider_name(&self) -> &str {
            "fake"
        }

        async fn fetch_token_metadata(&self, address: &str) -> Result<TokenMetadata, ApiError> {
            Ok(TokenMetadata::placeholder(address))
        }

        async fn fetch_reference_price(&self) -> Result<Option<f64>, ApiError> {
            Ok(Some(100.0))
        }

        async fn fetch_market_snapshot(&self, address: &str) -> Result<Option<MarketSnapshot>, ApiError> {
            self.calls.lock().unwrap().push(address.to_string());
            match self.market_caps.get(address) {
                Some(Some(mc)) => Ok(Some(MarketSnapshot {
                    address: address.to_string(),
                    current_market_cap: *mc,
                })),
                Some(None) => Ok(None),
                None => Err(ApiError::NetworkError("connection reset".to_string())),
            }
        }
    }

    fn trade(id: &str, address: Option<&str>, status: TradeStatus) -> Trade {
        Trade {
            id: id.to_string(),
            ticker: id.to_uppercase(),
            token_address: address.map(str::to_string),
            entry_market_cap: 100_000.0,
            exit_market_cap: (status == TradeStatus::Closed).then_some(200_000.0),
            size: 1.0,
            sol_price: 100.0,
            status,
            entry_date: Utc::now(),
            exit_date: None,
            note: String::new(),
            last_known_market_cap: None,
            last_update_time: None,
        }
    }

    fn refresher(caps: &[(&str, Option<f64>)], batch_size: usize) -> (UnrealizedRefresher, Arc<FakeMarket>) {
        let market = Arc::new(FakeMarket {
            market_caps: caps.iter().map(|(a, mc)| (a.to_string(), *mc)).collect(),
            calls: Mutex::new(Vec::new()),
        });
        let config = RefreshConfig {
            batch_size,
            group_pause: Duration::from_millis(1),
        };
        (UnrealizedRefresher::new(market.clone(), config), market)
    }

    #[tokio::test]
    async fn test_refresh_computes_entries_for_open_trades() {
        let (refresher, market) = refresher(&[("addr-a", Some(150_000.0))], 3);
        let trades = vec![
            trade("a", Some("addr-a"), TradeStatus::Open),
            trade("closed", Some("addr-a"), TradeStatus::Closed),
            trade("manual", None, TradeStatus::Open),
        ];

        let outcome = refresher.refresh(&trades).await;

        assert_eq!(outcome.entries.len(), 1);
        let entry = &outcome.entries[0];
        assert_eq!(entry.trade_id, "a");
        assert!((entry.pnl_percentage - 50.0).abs() < 1e-9);
        assert!((entry.pnl_usd - 50.0).abs() < 1e-9);
        assert!(outcome.skipped.is_empty());
        assert_eq!(market.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_data_and_errors_are_skipped() {
        let (refresher, _) = refresher(&[("ok", Some(50_000.0)), ("empty", None)], 2);
        let trades = vec![
            trade("empty", Some("empty"), TradeStatus::Open),
            trade("broken", Some("broken"), TradeStatus::Open),
            trade("ok", Some("ok"), TradeStatus::Open),
        ];

        let outcome = refresher.refresh(&trades).await;

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].trade_id, "ok");
        assert_eq!(outcome.skipped, vec!["empty".to_string(), "broken".to_string()]);
    }

    #[tokio::test]
    async fn test_groups_keep_trade_order() {
        let caps: Vec<(&str, Option<f64>)> =
            vec![("1", Some(1.0)), ("2", Some(1.0)), ("3", Some(1.0)), ("4", Some(1.0)), ("5", Some(1.0))];
        let (refresher, market) = refresher(&caps, 2);
        let trades: Vec<Trade> = ["1", "2", "3", "4", "5"]
            .iter()
            .map(|a| trade(a, Some(a), TradeStatus::Open))
            .collect();

        let outcome = refresher.refresh(&trades).await;

        assert_eq!(outcome.entries.len(), 5);
        assert_eq!(*market.calls.lock().unwrap(), vec!["1", "2", "3", "4", "5"]);
    }
}
