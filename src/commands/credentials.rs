use crate::api::SecureStorage;
use crate::api::secure_storage::MARKET_DATA_API_KEY;
use crate::error::TrackerError;
use crate::state::AppState;

/// Store the market-data API key. Picked up on next start.
pub fn set_api_key(state: &AppState, api_key: &str) -> Result<(), TrackerError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(TrackerError::validation("Please enter an API key"));
    }

    SecureStorage::new(&state.config.data_dir)?.store(MARKET_DATA_API_KEY, api_key)?;
    Ok(())
}

pub fn clear_api_key(state: &AppState) -> Result<(), TrackerError> {
    SecureStorage::new(&state.config.data_dir)?.delete(MARKET_DATA_API_KEY)?;
    log::info!("Market data API key removed");
    Ok(())
}

/// Masked form of the stored key, e.g. `abcd****`.
pub fn api_key_preview(state: &AppState) -> Result<Option<String>, TrackerError> {
    let stored = SecureStorage::new(&state.config.data_dir)?.retrieve(MARKET_DATA_API_KEY)?;
    Ok(stored.map(|key| {
        let head: String = key.chars().take(4).collect();
        format!("{}****", head)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::demo_state;

    #[test]
    fn test_store_preview_clear() {
        let (state, _dir) = demo_state();

        assert_eq!(api_key_preview(&state).unwrap(), None);
        assert!(set_api_key(&state, "  ").unwrap_err().is_validation());

        set_api_key(&state, "abcdef123456").unwrap();
        assert_eq!(api_key_preview(&state).unwrap().as_deref(), Some("abcd****"));

        clear_api_key(&state).unwrap();
        assert_eq!(api_key_preview(&state).unwrap(), None);
    }
}
