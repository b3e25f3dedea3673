use chrono::{DateTime, Duration, Utc};

use crate::error::TrackerError;
use crate::models::{StatusFilter, Trade};
use crate::pnl::{DashboardStats, EquityCurve, compute_stats, equity_curve};
use crate::state::AppState;

use super::trades::get_trades;

/// Earliest exit date a closed trade may have to count in a range.
///
/// Unknown or absent ranges mean all time.
fn range_threshold(date_range: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match date_range {
        Some("today") => now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc()),
        Some("week") => Some(now - Duration::days(7)),
        Some("month") => Some(now - Duration::days(30)),
        Some("3months") => Some(now - Duration::days(90)),
        Some("6months") => Some(now - Duration::days(180)),
        Some("year") => Some(now - Duration::days(365)),
        _ => None,
    }
}

/// Open trades always count; closed ones only if they exited inside the range.
fn in_range(trades: Vec<Trade>, threshold: Option<DateTime<Utc>>) -> Vec<Trade> {
    let Some(threshold) = threshold else {
        return trades;
    };
    trades
        .into_iter()
        .filter(|t| t.is_open() || t.exit_date.unwrap_or(t.entry_date) >= threshold)
        .collect()
}

pub async fn get_dashboard_stats(
    state: &AppState,
    date_range: Option<&str>,
) -> Result<DashboardStats, TrackerError> {
    let trades = in_range(
        get_trades(state, StatusFilter::All).await?,
        range_threshold(date_range, Utc::now()),
    );
    let tracker = state.tracker.lock().await;
    Ok(compute_stats(&trades, &tracker.unrealized))
}

pub async fn get_equity_curve(
    state: &AppState,
    date_range: Option<&str>,
) -> Result<EquityCurve, TrackerError> {
    let trades = in_range(
        get_trades(state, StatusFilter::Closed).await?,
        range_threshold(date_range, Utc::now()),
    );
    Ok(equity_curve(&trades))
}
