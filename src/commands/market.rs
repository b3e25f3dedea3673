use crate::api::ApiError;
use crate::error::TrackerError;
use crate::models::{TokenMetadata, UnrealizedPnLEntry};
use crate::state::{AppState, TradeSource};
use crate::sync::{RefreshConfig, RefreshOutcome, UnrealizedRefresher};

use super::settings::get_settings;
use super::trades::get_trades;

pub async fn lookup_token(state: &AppState, address: &str) -> Result<TokenMetadata, TrackerError> {
    match state.market.fetch_token_metadata(address.trim()).await {
        Ok(metadata) => Ok(metadata),
        Err(ApiError::InvalidAddress(_)) => {
            Err(TrackerError::validation("Please enter a valid Solana token address"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Fetch current market caps for every open trade and rebuild their
/// unrealized P/L entries.
///
/// Entries are repriced against the trade as it stands once the fetch is
/// done; trades closed or deleted meanwhile are reported as skipped. Snapshot
/// write-back to the collection is best effort.
pub async fn refresh_unrealized(state: &AppState) -> Result<RefreshOutcome, TrackerError> {
    let settings = get_settings(state).await?;
    let open = get_trades(state, crate::models::StatusFilter::Open).await?;

    let refresher = UnrealizedRefresher::new(
        state.market.clone(),
        RefreshConfig {
            batch_size: settings.refresh_batch_size.max(1) as usize,
            group_pause: state.config.refresh_group_pause,
        },
    );
    let fetched = refresher.refresh(&open).await;

    let mut outcome = RefreshOutcome {
        entries: Vec::with_capacity(fetched.entries.len()),
        skipped: fetched.skipped,
    };
    let user_id = {
        let mut tracker = state.tracker.lock().await;
        for entry in &fetched.entries {
            match tracker.apply_market_cap(entry) {
                Some(applied) => outcome.entries.push(applied),
                None => {
                    log::debug!("Trade {} changed during refresh; dropped", entry.trade_id);
                    outcome.skipped.push(entry.trade_id.clone());
                }
            }
        }
        tracker
            .source
            .as_ref()
            .and_then(TradeSource::user_id)
            .map(str::to_string)
    };

    if let Some(user_id) = user_id {
        for entry in &outcome.entries {
            if let Err(e) = state
                .repository
                .update_market_snapshot(&user_id, &entry.trade_id, entry.current_market_cap, entry.updated_at)
                .await
            {
                log::warn!("Failed to store market snapshot for {}: {}", entry.trade_id, e);
            }
        }
    }

    Ok(outcome)
}

/// Cached unrealized P/L in trade order.
pub async fn get_unrealized(state: &AppState) -> Result<Vec<UnrealizedPnLEntry>, TrackerError> {
    let tracker = state.tracker.lock().await;
    Ok(tracker
        .store
        .trades()
        .iter()
        .filter_map(|t| tracker.unrealized.get(&t.id).cloned())
        .collect())
}
