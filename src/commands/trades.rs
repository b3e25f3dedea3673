use crate::api::is_valid_token_address;
use crate::error::TrackerError;
use crate::models::{
    CreateTradeInput, EditTradeInput, NewTrade, StatusFilter, Trade, shorten_address,
};
use crate::pnl::{parse_market_cap, parse_position_size, positive};
use crate::state::{AppState, TrackerState, TradeSource};
use crate::store::demo_trades;

use super::session::{RouteDecision, TRADES_ROUTE, current_user, guard_route};
use super::settings::get_settings;

/// Pick the active collection from the test-mode flag and the session.
async fn resolve_source(state: &AppState) -> Result<TradeSource, TrackerError> {
    let settings = get_settings(state).await?;
    if settings.test_mode {
        return Ok(TradeSource::Demo);
    }

    let user = current_user(state)?;
    match (guard_route(TRADES_ROUTE, user.is_some()), user) {
        (RouteDecision::Allow, Some(user_id)) => Ok(TradeSource::Remote { user_id }),
        (RouteDecision::Redirect(to), _) => Err(TrackerError::Unauthenticated(format!(
            "sign in to see your trades (redirected to {})",
            to
        ))),
        (RouteDecision::Allow, None) => {
            Err(TrackerError::Unauthenticated("no active session".to_string()))
        }
    }
}

async fn load_into(state: &AppState, tracker: &mut TrackerState) -> Result<TradeSource, TrackerError> {
    let source = resolve_source(state).await?;

    let trades = match &source {
        TradeSource::Demo => demo_trades(),
        TradeSource::Remote { user_id } => state.repository.list(user_id).await?,
    };

    log::info!("Loaded {} trades ({:?})", trades.len(), source);

    tracker.store.replace_all(trades);
    tracker.unrealized.clear();
    tracker.source = Some(source.clone());
    Ok(source)
}

async fn ensure_loaded(state: &AppState, tracker: &mut TrackerState) -> Result<(), TrackerError> {
    if tracker.source.is_none() {
        load_into(state, tracker).await?;
    }
    Ok(())
}

/// (Re)load the active collection, replacing whatever is in memory.
pub async fn load_trades(state: &AppState) -> Result<TradeSource, TrackerError> {
    let mut tracker = state.tracker.lock().await;
    load_into(state, &mut tracker).await
}

/// Apply a remote change notification for `user_id`.
///
/// Ignored unless that user's collection is the one on screen.
pub async fn reload_from_remote(state: &AppState, user_id: &str) -> Result<bool, TrackerError> {
    let mut tracker = state.tracker.lock().await;
    let is_active = tracker
        .source
        .as_ref()
        .and_then(TradeSource::user_id)
        .is_some_and(|active| active == user_id);
    if !is_active {
        return Ok(false);
    }

    let trades = state.repository.list(user_id).await?;
    tracker.store.replace_all(trades);
    tracker.reprice_unrealized();
    Ok(true)
}

pub async fn get_trades(state: &AppState, filter: StatusFilter) -> Result<Vec<Trade>, TrackerError> {
    let mut tracker = state.tracker.lock().await;
    ensure_loaded(state, &mut tracker).await?;

    Ok(tracker
        .store
        .trades()
        .iter()
        .filter(|t| filter.matches(t))
        .cloned()
        .collect())
}

pub async fn get_trade(state: &AppState, id: &str) -> Result<Trade, TrackerError> {
    let mut tracker = state.tracker.lock().await;
    ensure_loaded(state, &mut tracker).await?;

    tracker
        .store
        .get(id)
        .cloned()
        .ok_or_else(|| TrackerError::NotFound(format!("Trade {}", id)))
}

fn remote_error(err: TrackerError) -> TrackerError {
    match err {
        TrackerError::Remote(_) => err,
        other => TrackerError::Remote(other.to_string()),
    }
}

async fn mirror_upsert(state: &AppState, tracker: &TrackerState, trade: &Trade) -> Result<(), TrackerError> {
    let Some(user_id) = tracker.source.as_ref().and_then(TradeSource::user_id) else {
        return Ok(());
    };

    state.repository.upsert(user_id, trade).await.map_err(|e| {
        log::error!("Failed to mirror trade {} for {}: {}", trade.id, user_id, e);
        remote_error(e)
    })
}

/// Validated form values, before the ticker and SOL price are resolved.
struct ValidatedInput {
    token_address: String,
    size: f64,
    entry_market_cap: f64,
    exit_market_cap: Option<f64>,
}

fn validate_create(input: &CreateTradeInput) -> Result<ValidatedInput, TrackerError> {
    let token_address = input.token_address.trim();
    if !is_valid_token_address(token_address) {
        return Err(TrackerError::validation("Please enter a valid Solana token address"));
    }

    let size = positive(parse_position_size(&input.size))
        .ok_or_else(|| TrackerError::validation("Please enter a valid position size"))?;

    if input.entry_market_cap.trim().is_empty() {
        return Err(TrackerError::validation("Please enter entry market cap"));
    }
    let entry_market_cap = positive(parse_market_cap(&input.entry_market_cap))
        .ok_or_else(|| TrackerError::validation("Please enter a valid entry market cap"))?;

    let exit_market_cap = match input.exit_market_cap.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            positive(parse_market_cap(raw))
                .ok_or_else(|| TrackerError::validation("Please enter a valid exit market cap"))?,
        ),
    };

    Ok(ValidatedInput {
        token_address: token_address.to_string(),
        size,
        entry_market_cap,
        exit_market_cap,
    })
}

async fn resolve_ticker(state: &AppState, input: &CreateTradeInput, address: &str) -> String {
    if let Some(ticker) = input.ticker.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return ticker.to_string();
    }

    match state.market.fetch_token_metadata(address).await {
        Ok(metadata) => metadata.symbol,
        Err(e) => {
            log::warn!("Token metadata lookup failed for {}: {}", address, e);
            shorten_address(address)
        }
    }
}

async fn resolve_sol_price(state: &AppState, input: &CreateTradeInput) -> Result<f64, TrackerError> {
    if let Some(price) = input.sol_price.and_then(positive) {
        return Ok(price);
    }

    let fetched = match state.market.fetch_reference_price().await {
        Ok(price) => price,
        Err(e) => {
            log::warn!("SOL price lookup failed: {}", e);
            None
        }
    };

    fetched
        .and_then(positive)
        .ok_or_else(|| TrackerError::validation("Could not fetch the current SOL price, please try again"))
}

pub async fn create_trade(state: &AppState, input: CreateTradeInput) -> Result<Trade, TrackerError> {
    let validated = validate_create(&input)?;

    // Market-data lookups happen before taking the tracker lock.
    let ticker = resolve_ticker(state, &input, &validated.token_address).await;
    let sol_price = resolve_sol_price(state, &input).await?;

    let mut tracker = state.tracker.lock().await;
    ensure_loaded(state, &mut tracker).await?;

    let trade = tracker.store.add(NewTrade {
        ticker,
        token_address: Some(validated.token_address),
        entry_market_cap: validated.entry_market_cap,
        exit_market_cap: validated.exit_market_cap,
        size: validated.size,
        sol_price,
        note: input.note.trim().to_string(),
    });
    log::info!("Trade {} added ({} {})", trade.id, trade.ticker, trade.status);

    mirror_upsert(state, &tracker, &trade).await?;
    Ok(trade)
}

pub async fn close_trade(state: &AppState, id: &str, exit_market_cap: &str) -> Result<Trade, TrackerError> {
    let mut tracker = state.tracker.lock().await;
    ensure_loaded(state, &mut tracker).await?;

    let trade = tracker.store.close(id, exit_market_cap)?;
    tracker.unrealized.remove(id);
    log::info!("Trade {} closed at {}", trade.id, exit_market_cap.trim());

    mirror_upsert(state, &tracker, &trade).await?;
    Ok(trade)
}

pub async fn edit_trade(state: &AppState, id: &str, input: EditTradeInput) -> Result<Trade, TrackerError> {
    let mut tracker = state.tracker.lock().await;
    ensure_loaded(state, &mut tracker).await?;

    let trade = tracker.store.edit(id, &input)?;
    tracker.reprice_unrealized();
    log::info!("Trade {} edited", trade.id);

    mirror_upsert(state, &tracker, &trade).await?;
    Ok(trade)
}

/// Delete a trade. Returns whether anything was removed; unknown ids are a no-op.
pub async fn delete_trade(state: &AppState, id: &str) -> Result<bool, TrackerError> {
    let mut tracker = state.tracker.lock().await;
    ensure_loaded(state, &mut tracker).await?;

    let Some(removed) = tracker.store.delete(id) else {
        return Ok(false);
    };
    tracker.unrealized.remove(id);
    log::info!("Trade {} deleted", removed.id);

    if let Some(user_id) = tracker.source.as_ref().and_then(TradeSource::user_id) {
        state.repository.delete(user_id, id).await.map_err(|e| {
            log::error!("Failed to delete trade {} for {}: {}", id, user_id, e);
            remote_error(e)
        })?;
    }
    Ok(true)
}
