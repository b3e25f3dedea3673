use crate::error::TrackerError;
use crate::local_storage::SESSION_KEY;
use crate::state::AppState;

pub const PUBLIC_PATHS: &[&str] = &["/login"];
pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";
/// Route every live-mode trade command goes through.
pub const TRADES_ROUTE: &str = "/trades";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// Session gate for a requested path.
pub fn guard_route(path: &str, logged_in: bool) -> RouteDecision {
    let is_public = PUBLIC_PATHS.contains(&path);

    if logged_in && is_public {
        return RouteDecision::Redirect(HOME_ROUTE.to_string());
    }
    if !logged_in && !is_public && path != HOME_ROUTE {
        return RouteDecision::Redirect(LOGIN_ROUTE.to_string());
    }
    RouteDecision::Allow
}

pub fn current_user(state: &AppState) -> Result<Option<String>, TrackerError> {
    Ok(state
        .local_storage
        .get_item(SESSION_KEY)?
        .filter(|user| !user.trim().is_empty()))
}

pub async fn login(state: &AppState, user_id: &str) -> Result<(), TrackerError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(TrackerError::validation("Please enter a user id"));
    }

    state.local_storage.set_item(SESSION_KEY, user_id)?;
    invalidate_source(state).await;
    log::info!("Signed in as {}", user_id);
    Ok(())
}

pub async fn logout(state: &AppState) -> Result<(), TrackerError> {
    state.local_storage.remove_item(SESSION_KEY)?;
    invalidate_source(state).await;
    log::info!("Signed out");
    Ok(())
}

/// Forget the loaded collection so the next command re-resolves it.
async fn invalidate_source(state: &AppState) {
    let mut tracker = state.tracker.lock().await;
    tracker.source = None;
    tracker.store.replace_all(Vec::new());
    tracker.unrealized.clear();
}
