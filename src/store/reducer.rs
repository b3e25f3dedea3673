use chrono::{DateTime, Utc};

use crate::error::TrackerError;
use crate::models::{EditTradeInput, NewTrade, Trade, TradeStatus, now_millis};
use crate::pnl::{parse_market_cap, parse_position_size, positive};

pub fn generate_trade_id() -> String {
    format!("TRADE-{}-{}", Utc::now().timestamp_millis(), uuid::Uuid::new_v4())
}

/// Ordered in-memory trade collection.
///
/// Every mutation validates first and only then touches the collection, so a
/// rejected call leaves the store exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct TradeStore {
    trades: Vec<Trade>,
}

impl TradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_trades(trades: Vec<Trade>) -> Self {
        Self { trades }
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn get(&self, id: &str) -> Option<&Trade> {
        self.trades.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn add(&mut self, new_trade: NewTrade) -> Trade {
        self.add_at(new_trade, now_millis())
    }

    pub fn add_at(&mut self, new_trade: NewTrade, now: DateTime<Utc>) -> Trade {
        let exit_market_cap = new_trade.exit_market_cap.and_then(positive);
        let status = TradeStatus::derive(exit_market_cap);

        let trade = Trade {
            id: generate_trade_id(),
            ticker: new_trade.ticker,
            token_address: new_trade.token_address,
            entry_market_cap: new_trade.entry_market_cap,
            exit_market_cap,
            size: new_trade.size,
            sol_price: new_trade.sol_price,
            status,
            entry_date: now,
            exit_date: (status == TradeStatus::Closed).then_some(now),
            note: new_trade.note,
            last_known_market_cap: None,
            last_update_time: None,
        };

        self.trades.push(trade.clone());
        trade
    }

    pub fn close(&mut self, id: &str, exit_market_cap: &str) -> Result<Trade, TrackerError> {
        self.close_at(id, exit_market_cap, now_millis())
    }

    pub fn close_at(
        &mut self,
        id: &str,
        exit_market_cap: &str,
        now: DateTime<Utc>,
    ) -> Result<Trade, TrackerError> {
        if exit_market_cap.trim().is_empty() {
            return Err(TrackerError::validation("Please enter exit market cap"));
        }
        let exit = positive(parse_market_cap(exit_market_cap))
            .ok_or_else(|| TrackerError::validation("Please enter a valid exit market cap"))?;

        let trade = self
            .trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TrackerError::NotFound(format!("Trade {}", id)))?;

        trade.exit_market_cap = Some(exit);
        trade.status = TradeStatus::Closed;
        trade.exit_date = Some(now);

        Ok(trade.clone())
    }

    pub fn edit(&mut self, id: &str, input: &EditTradeInput) -> Result<Trade, TrackerError> {
        self.edit_at(id, input, now_millis())
    }

    pub fn edit_at(
        &mut self,
        id: &str,
        input: &EditTradeInput,
        now: DateTime<Utc>,
    ) -> Result<Trade, TrackerError> {
        let entry = positive(parse_market_cap(&input.entry_market_cap))
            .ok_or_else(|| TrackerError::validation("Please enter a valid entry market cap"))?;
        let size = positive(parse_position_size(&input.size))
            .ok_or_else(|| TrackerError::validation("Please enter a valid size"))?;

        let exit = match input.exit_market_cap.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                positive(parse_market_cap(raw)).ok_or_else(|| {
                    TrackerError::validation("Please enter a valid exit market cap")
                })?,
            ),
        };

        let trade = self
            .trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TrackerError::NotFound(format!("Trade {}", id)))?;

        trade.entry_market_cap = entry;
        trade.size = size;
        trade.note = input.note.clone();
        trade.exit_market_cap = exit;
        trade.status = TradeStatus::derive(exit);
        trade.exit_date = (trade.status == TradeStatus::Closed).then_some(now);

        Ok(trade.clone())
    }

    /// Removes the trade if present. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Option<Trade> {
        let index = self.trades.iter().position(|t| t.id == id)?;
        Some(self.trades.remove(index))
    }

    pub fn replace_all(&mut self, trades: Vec<Trade>) {
        self.trades = trades;
    }

    pub fn record_market_snapshot(&mut self, id: &str, market_cap: f64, at: DateTime<Utc>) {
        if let Some(trade) = self.trades.iter_mut().find(|t| t.id == id) {
            trade.last_known_market_cap = Some(market_cap);
            trade.last_update_time = Some(at);
        }
    }
}
