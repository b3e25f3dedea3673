use chrono::{Duration, Utc};

use crate::models::{Trade, TradeStatus};

/// Sample trades shown while test mode is on. Never persisted.
pub fn demo_trades() -> Vec<Trade> {
    let now = Utc::now();

    vec![
        Trade {
            id: "DEMO-1".to_string(),
            ticker: "BONK".to_string(),
            token_address: Some("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".to_string()),
            entry_market_cap: 150_000.0,
            exit_market_cap: Some(450_000.0),
            size: 10.0,
            sol_price: 98.0,
            status: TradeStatus::Closed,
            entry_date: now - Duration::days(6),
            exit_date: Some(now - Duration::days(5)),
            note: "Early entry, took profit at 3x".to_string(),
            last_known_market_cap: None,
            last_update_time: None,
        },
        Trade {
            id: "DEMO-2".to_string(),
            ticker: "WIF".to_string(),
            token_address: Some("EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm".to_string()),
            entry_market_cap: 2_000_000.0,
            exit_market_cap: Some(1_200_000.0),
            size: 5.0,
            sol_price: 102.5,
            status: TradeStatus::Closed,
            entry_date: now - Duration::days(4),
            exit_date: Some(now - Duration::days(3)),
            note: "Chased the pump".to_string(),
            last_known_market_cap: None,
            last_update_time: None,
        },
        Trade {
            id: "DEMO-3".to_string(),
            ticker: "POPCAT".to_string(),
            token_address: Some("7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr".to_string()),
            entry_market_cap: 800_000.0,
            exit_market_cap: None,
            size: 3.0,
            sol_price: 110.0,
            status: TradeStatus::Open,
            entry_date: now - Duration::days(1),
            exit_date: None,
            note: String::new(),
            last_known_market_cap: None,
            last_update_time: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_trades_respect_status_invariant() {
        for trade in demo_trades() {
            assert!(trade.entry_market_cap > 0.0);
            assert!(trade.size > 0.0);
            assert_eq!(trade.is_closed(), trade.exit_market_cap.is_some());
            assert_eq!(trade.is_closed(), trade.exit_date.is_some());
        }
    }
}
