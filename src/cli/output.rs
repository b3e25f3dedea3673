//! Shared output helpers for the dashboard.

use std::collections::HashMap;
use std::fmt::Display;

use crate::models::{Settings, TokenMetadata, Trade, UnrealizedPnLEntry, Widget};
use crate::pnl::{DashboardStats, EquityCurve, format_market_cap, realized_pnl};

const RULE_WIDTH: usize = 72;

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "─".repeat(RULE_WIDTH));
}

/// Print a simple key/value line.
pub fn key_value(label: &str, value: impl Display) {
    println!("{label:<18} {value}");
}

pub fn ok(message: &str) {
    println!("✓ {message}");
}

pub fn warn(message: &str) {
    println!("⚠ {message}");
}

pub fn error(message: &str) {
    eprintln!("✗ {message}");
}

pub fn note(message: &str) {
    println!("{message}");
}

fn usd(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

fn signed_percent(value: f64) -> String {
    format!("{:+.2}%", value)
}

fn market_cap_cell(value: Option<f64>) -> String {
    match value.map(format_market_cap) {
        Some(formatted) if !formatted.is_empty() => formatted,
        _ => "-".to_string(),
    }
}

/// P/L cell: realized for closed trades, cached unrealized (marked `~`) for open ones.
fn pnl_cell(trade: &Trade, unrealized: &HashMap<String, UnrealizedPnLEntry>) -> String {
    if let Some(pnl) = realized_pnl(trade) {
        return format!("{} {}", signed_percent(pnl.percentage), usd(pnl.usd));
    }
    match unrealized.get(&trade.id) {
        Some(entry) => format!("~{} {}", signed_percent(entry.pnl_percentage), usd(entry.pnl_usd)),
        None => "-".to_string(),
    }
}

pub fn trades_table(trades: &[Trade], unrealized: &HashMap<String, UnrealizedPnLEntry>) {
    if trades.is_empty() {
        note("No trades yet");
        return;
    }

    println!(
        "{:<12} {:<7} {:>10} {:>10} {:>8} {:>10}  {:<24} {}",
        "TICKER", "STATUS", "ENTRY MC", "EXIT MC", "SIZE", "USD", "P/L", "ID"
    );
    for trade in trades {
        println!(
            "{:<12} {:<7} {:>10} {:>10} {:>8} {:>10}  {:<24} {}",
            trade.ticker,
            trade.status,
            market_cap_cell(Some(trade.entry_market_cap)),
            market_cap_cell(trade.exit_market_cap),
            format!("{:.2}", trade.size),
            usd(trade.entry_usd()),
            pnl_cell(trade, unrealized),
            trade.id
        );
    }
}

pub fn trade_detail(trade: &Trade, unrealized: &HashMap<String, UnrealizedPnLEntry>) {
    section(&format!("{} ({})", trade.ticker, trade.status));
    key_value("ID", &trade.id);
    key_value("Token", trade.token_address.as_deref().unwrap_or("-"));
    key_value("Entry MC", market_cap_cell(Some(trade.entry_market_cap)));
    key_value("Exit MC", market_cap_cell(trade.exit_market_cap));
    key_value("Size", format!("{} SOL @ {}", trade.size, usd(trade.sol_price)));
    key_value("Position", usd(trade.entry_usd()));
    key_value("Entry date", trade.entry_date.format("%Y-%m-%d %H:%M UTC"));
    if let Some(exit_date) = trade.exit_date {
        key_value("Exit date", exit_date.format("%Y-%m-%d %H:%M UTC"));
    }
    key_value("P/L", pnl_cell(trade, unrealized));
    if let (Some(mc), Some(at)) = (trade.last_known_market_cap, trade.last_update_time) {
        key_value("Last market cap", format!("{} at {}", market_cap_cell(Some(mc)), at.format("%H:%M:%S")));
    }
    if !trade.note.is_empty() {
        key_value("Note", &trade.note);
    }
}

pub fn stats(stats: &DashboardStats) {
    section("Dashboard");
    key_value("Total trades", stats.total_trades);
    key_value("Open positions", stats.open_positions);
    key_value("Closed trades", stats.closed_trades);
    key_value("Win rate", format!("{:.1}%", stats.win_rate));
    key_value("Realized P/L", usd(stats.total_realized_pnl));
    key_value("Unrealized P/L", usd(stats.total_unrealized_pnl));
    key_value("Total P/L", usd(stats.total_pnl));
    key_value("Average trade", usd(stats.average_trade_pnl));
    key_value("Best trade", usd(stats.best_trade));
    key_value("Worst trade", usd(stats.worst_trade));
}

pub fn equity_curve(curve: &EquityCurve) {
    section("P/L over time");
    if curve.points.is_empty() {
        note("No closed trades");
        return;
    }
    for point in &curve.points {
        println!(
            "{}  {:>12}  {:>12}",
            point.date.format("%Y-%m-%d"),
            usd(point.pnl),
            usd(point.cumulative_pnl)
        );
    }
    key_value("Axis", format!("{} .. {}", usd(curve.axis_min), usd(curve.axis_max)));
}

pub fn token(metadata: &TokenMetadata) {
    section(&metadata.symbol);
    key_value("Name", &metadata.name);
    key_value("Address", &metadata.address);
    key_value("Supply", metadata.supply);
    key_value("Decimals", metadata.decimals);
    key_value("Program", &metadata.token_type);
}

pub fn settings(settings: &Settings) {
    section("Settings");
    key_value("Mode", if settings.test_mode { "demo" } else { "live" });
    key_value("Refresh interval", format!("{}s", settings.refresh_interval_secs));
    key_value("Refresh batch", settings.refresh_batch_size);
}

pub fn widgets(widgets: &[Widget]) {
    section("Widgets");
    for widget in widgets {
        let (w, h) = widget.size.span();
        println!(
            "{:<24} {:<16} {}x{} at ({}, {})",
            widget.id, widget.title, w, h, widget.x, widget.y
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_formatting() {
        assert_eq!(usd(1960.0), "$1960.00");
        assert_eq!(usd(-205.0), "-$205.00");
    }

    #[test]
    fn test_market_cap_cell() {
        assert_eq!(market_cap_cell(Some(150_000.0)), "150.00k");
        assert_eq!(market_cap_cell(None), "-");
    }
}
