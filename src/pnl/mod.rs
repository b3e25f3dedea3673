//! Market-cap parsing, P/L arithmetic and dashboard aggregates.

pub mod calculator;
pub mod market_cap;
pub mod stats;

pub use calculator::{PnL, pnl_between, realized_pnl, unrealized_entry, unrealized_pnl};
pub use market_cap::{format_market_cap, parse_market_cap, parse_position_size, positive};
pub use stats::{DashboardStats, EquityCurve, EquityCurvePoint, compute_stats, equity_curve};
