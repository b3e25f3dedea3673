use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::calculator::{is_win, realized_pnl};
use crate::models::{Trade, UnrealizedPnLEntry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_trades: usize,
    pub open_positions: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub total_realized_pnl: f64,
    pub total_unrealized_pnl: f64,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub average_trade_pnl: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub date: DateTime<Utc>,
    pub pnl: f64,
    pub cumulative_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub points: Vec<EquityCurvePoint>,
    /// Y axis bounds, padded by 5% of the range and always including zero.
    pub axis_min: f64,
    pub axis_max: f64,
}

pub fn compute_stats(
    trades: &[Trade],
    unrealized: &HashMap<String, UnrealizedPnLEntry>,
) -> DashboardStats {
    let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    let realized: Vec<f64> = closed
        .iter()
        .filter_map(|t| realized_pnl(t))
        .map(|p| p.usd)
        .collect();

    let total_realized_pnl: f64 = realized.iter().sum();

    // Entries for trades that have since closed or been deleted are stale.
    let total_unrealized_pnl: f64 = trades
        .iter()
        .filter(|t| t.is_open())
        .filter_map(|t| unrealized.get(&t.id))
        .map(|e| e.pnl_usd)
        .sum();

    let winning_trades = closed.iter().filter(|t| is_win(t)).count();

    let win_rate = if closed.is_empty() {
        0.0
    } else {
        winning_trades as f64 / closed.len() as f64 * 100.0
    };

    let average_trade_pnl = if closed.is_empty() {
        0.0
    } else {
        total_realized_pnl / closed.len() as f64
    };

    let best_trade = realized.iter().cloned().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.max(v)))
    });
    let worst_trade = realized.iter().cloned().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.min(v)))
    });

    DashboardStats {
        total_trades: trades.len(),
        open_positions: trades.iter().filter(|t| t.is_open()).count(),
        closed_trades: closed.len(),
        winning_trades,
        total_realized_pnl,
        total_unrealized_pnl,
        total_pnl: total_realized_pnl + total_unrealized_pnl,
        win_rate,
        average_trade_pnl,
        best_trade: best_trade.unwrap_or(0.0),
        worst_trade: worst_trade.unwrap_or(0.0),
    }
}

/// Cumulative realized P/L over closed trades, ordered by exit date.
pub fn equity_curve(trades: &[Trade]) -> EquityCurve {
    let mut realized: Vec<(DateTime<Utc>, f64)> = trades
        .iter()
        .filter_map(|t| {
            let pnl = realized_pnl(t)?;
            Some((t.exit_date.unwrap_or(t.entry_date), pnl.usd))
        })
        .collect();
    realized.sort_by_key(|(date, _)| *date);

    let mut cumulative = 0.0;
    let points: Vec<EquityCurvePoint> = realized
        .into_iter()
        .map(|(date, pnl)| {
            cumulative += pnl;
            EquityCurvePoint {
                date,
                pnl,
                cumulative_pnl: cumulative,
            }
        })
        .collect();

    let max = points.iter().map(|p| p.cumulative_pnl).fold(0.0, f64::max);
    let min = points.iter().map(|p| p.cumulative_pnl).fold(0.0, f64::min);
    let padding = (max - min) * 0.05;

    EquityCurve {
        points,
        axis_min: min - padding,
        axis_max: max + padding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeStatus;
    use chrono::{Duration, TimeZone};

    fn base_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn closed(id: &str, entry: f64, exit: f64, days: i64) -> Trade {
        Trade {
            id: id.to_string(),
            ticker: id.to_uppercase(),
            token_address: None,
            entry_market_cap: entry,
            exit_market_cap: Some(exit),
            size: 1.0,
            sol_price: 100.0,
            status: TradeStatus::Closed,
            entry_date: base_date(),
            exit_date: Some(base_date() + Duration::days(days)),
            note: String::new(),
            last_known_market_cap: None,
            last_update_time: None,
        }
    }

    fn open(id: &str) -> Trade {
        Trade {
            exit_market_cap: None,
            status: TradeStatus::Open,
            exit_date: None,
            ..closed(id, 100_000.0, 0.0, 0)
        }
    }

    #[test]
    fn test_win_rate_zero_without_closed_trades() {
        let stats = compute_stats(&[open("a")], &HashMap::new());
        assert_eq!(stats.win_rate, 0.0);
        assert!(!stats.win_rate.is_nan());
        assert_eq!(stats.average_trade_pnl, 0.0);
        assert_eq!(stats.open_positions, 1);
        assert_eq!(stats.total_trades, 1);
    }

    #[test]
    fn test_empty_collection() {
        let stats = compute_stats(&[], &HashMap::new());
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.total_pnl, 0.0);
        assert_eq!(stats.best_trade, 0.0);
    }

    #[test]
    fn test_realized_and_unrealized_totals() {
        let trades = vec![
            closed("win", 100_000.0, 200_000.0, 1),  // +100
            closed("loss", 100_000.0, 50_000.0, 2), // -50
            open("hold"),
        ];
        let mut unrealized = HashMap::new();
        unrealized.insert(
            "hold".to_string(),
            UnrealizedPnLEntry {
                trade_id: "hold".to_string(),
                current_market_cap: 150_000.0,
                pnl_percentage: 50.0,
                pnl_usd: 50.0,
                updated_at: base_date(),
            },
        );
        // Stale entry for a closed trade is ignored
        unrealized.insert(
            "win".to_string(),
            UnrealizedPnLEntry {
                trade_id: "win".to_string(),
                current_market_cap: 1.0,
                pnl_percentage: -99.0,
                pnl_usd: -999.0,
                updated_at: base_date(),
            },
        );

        let stats = compute_stats(&trades, &unrealized);
        assert_eq!(stats.closed_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert!((stats.total_realized_pnl - 50.0).abs() < 1e-9);
        assert!((stats.total_unrealized_pnl - 50.0).abs() < 1e-9);
        assert!((stats.total_pnl - 100.0).abs() < 1e-9);
        assert!((stats.win_rate - 50.0).abs() < 1e-9);
        assert!((stats.average_trade_pnl - 25.0).abs() < 1e-9);
        assert!((stats.best_trade - 100.0).abs() < 1e-9);
        assert!((stats.worst_trade + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_equity_curve_sorted_by_exit_date() {
        let trades = vec![
            closed("late", 100_000.0, 50_000.0, 5),
            closed("early", 100_000.0, 300_000.0, 1),
            open("ignored"),
        ];
        let curve = equity_curve(&trades);

        assert_eq!(curve.points.len(), 2);
        assert!((curve.points[0].cumulative_pnl - 200.0).abs() < 1e-9);
        assert!((curve.points[1].cumulative_pnl - 150.0).abs() < 1e-9);
        assert!((curve.axis_max - 210.0).abs() < 1e-9);
        assert!((curve.axis_min + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_equity_curve_empty() {
        let curve = equity_curve(&[]);
        assert!(curve.points.is_empty());
        assert_eq!(curve.axis_min, 0.0);
        assert_eq!(curve.axis_max, 0.0);
    }
}
