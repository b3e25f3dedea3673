use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Trade, UnrealizedPnLEntry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnL {
    pub percentage: f64,
    pub usd: f64,
}

/// P/L of a position moving from `entry_mc` to `current_mc`.
///
/// The USD leg scales the entry value (`size * sol_price`) by the market cap
/// ratio. `sol_price` is the entry-time price on both sides.
pub fn pnl_between(entry_mc: f64, current_mc: f64, size: f64, sol_price: f64) -> PnL {
    let entry_usd = size * sol_price;
    PnL {
        percentage: (current_mc - entry_mc) / entry_mc * 100.0,
        usd: entry_usd * (current_mc / entry_mc) - entry_usd,
    }
}

/// Realized P/L, only for closed trades carrying an exit market cap.
pub fn realized_pnl(trade: &Trade) -> Option<PnL> {
    if !trade.is_closed() {
        return None;
    }
    let exit = trade.exit_market_cap?;
    Some(pnl_between(trade.entry_market_cap, exit, trade.size, trade.sol_price))
}

/// Unrealized P/L of an open trade at `current_mc`.
pub fn unrealized_pnl(trade: &Trade, current_mc: f64) -> Option<PnL> {
    if !trade.is_open() || !current_mc.is_finite() || current_mc <= 0.0 {
        return None;
    }
    Some(pnl_between(trade.entry_market_cap, current_mc, trade.size, trade.sol_price))
}

pub fn unrealized_entry(
    trade: &Trade,
    current_mc: f64,
    at: DateTime<Utc>,
) -> Option<UnrealizedPnLEntry> {
    let pnl = unrealized_pnl(trade, current_mc)?;
    Some(UnrealizedPnLEntry {
        trade_id: trade.id.clone(),
        current_market_cap: current_mc,
        pnl_percentage: pnl.percentage,
        pnl_usd: pnl.usd,
        updated_at: at,
    })
}

/// Whether a closed trade counts as a win (raw market cap went up).
pub fn is_win(trade: &Trade) -> bool {
    match trade.exit_market_cap {
        Some(exit) if trade.is_closed() => exit - trade.entry_market_cap > 0.0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeStatus;

    fn trade(status: TradeStatus, exit: Option<f64>) -> Trade {
        Trade {
            id: "t1".to_string(),
            ticker: "WIF".to_string(),
            token_address: None,
            entry_market_cap: 150_000.0,
            exit_market_cap: exit,
            size: 10.0,
            sol_price: 98.0,
            status,
            entry_date: Utc::now(),
            exit_date: None,
            note: String::new(),
            last_known_market_cap: None,
            last_update_time: None,
        }
    }

    #[test]
    fn test_closed_trade_pnl() {
        let pnl = realized_pnl(&trade(TradeStatus::Closed, Some(450_000.0))).unwrap();
        assert!((pnl.percentage - 200.0).abs() < 1e-9);
        // 980 USD in, 3x market cap
        assert!((pnl.usd - 1_960.0).abs() < 1e-9);
    }

    #[test]
    fn test_losing_trade_pnl() {
        let pnl = realized_pnl(&trade(TradeStatus::Closed, Some(75_000.0))).unwrap();
        assert!((pnl.percentage + 50.0).abs() < 1e-9);
        assert!((pnl.usd + 490.0).abs() < 1e-9);
        assert!(!is_win(&trade(TradeStatus::Closed, Some(75_000.0))));
    }

    #[test]
    fn test_open_trade_has_no_realized_pnl() {
        assert!(realized_pnl(&trade(TradeStatus::Open, None)).is_none());
    }

    #[test]
    fn test_unrealized_uses_current_market_cap() {
        let open = trade(TradeStatus::Open, None);
        let pnl = unrealized_pnl(&open, 300_000.0).unwrap();
        assert!((pnl.percentage - 100.0).abs() < 1e-9);
        assert!((pnl.usd - 980.0).abs() < 1e-9);

        assert!(unrealized_pnl(&open, f64::NAN).is_none());
        assert!(unrealized_pnl(&trade(TradeStatus::Closed, Some(1.0)), 300_000.0).is_none());
    }

    #[test]
    fn test_unrealized_entry_is_keyed_by_trade() {
        let open = trade(TradeStatus::Open, None);
        let entry = unrealized_entry(&open, 300_000.0, Utc::now()).unwrap();
        assert_eq!(entry.trade_id, "t1");
        assert_eq!(entry.current_market_cap, 300_000.0);
    }
}
