use crate::error::TrackerError;
use crate::models::{Settings, UpdateSettingsInput};
use crate::state::AppState;

use super::trades::load_trades;

pub async fn get_settings(state: &AppState) -> Result<Settings, TrackerError> {
    let conn = state.db.conn.lock().map_err(|e| TrackerError::Database(e.to_string()))?;

    let settings = conn.query_row(
        "SELECT id, test_mode, refresh_interval_secs, refresh_batch_size, created_at, updated_at FROM settings WHERE id = 1",
        [],
        |row| {
            Ok(Settings {
                id: row.get(0)?,
                test_mode: row.get::<_, i32>(1)? == 1,
                refresh_interval_secs: row.get(2)?,
                refresh_batch_size: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        },
    )?;

    Ok(settings)
}

pub async fn update_settings(
    state: &AppState,
    settings: UpdateSettingsInput,
) -> Result<Settings, TrackerError> {
    if settings.refresh_interval_secs.is_some_and(|v| v < 1) {
        return Err(TrackerError::validation("Refresh interval must be at least 1 second"));
    }
    if settings.refresh_batch_size.is_some_and(|v| v < 1) {
        return Err(TrackerError::validation("Refresh batch size must be at least 1"));
    }

    {
        let conn = state.db.conn.lock().map_err(|e| TrackerError::Database(e.to_string()))?;

        // Build dynamic UPDATE query
        let mut updates = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(val) = settings.test_mode {
            updates.push("test_mode = ?");
            values.push(Box::new(val as i32));
        }
        if let Some(val) = settings.refresh_interval_secs {
            updates.push("refresh_interval_secs = ?");
            values.push(Box::new(val));
        }
        if let Some(val) = settings.refresh_batch_size {
            updates.push("refresh_batch_size = ?");
            values.push(Box::new(val));
        }

        updates.push("updated_at = strftime('%s', 'now')");

        let query = format!("UPDATE settings SET {} WHERE id = 1", updates.join(", "));
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        conn.execute(&query, params.as_slice())?;
    }

    get_settings(state).await
}

/// Flip between demo data and the signed-in user's collection.
///
/// The unrealized cache belongs to the previous source and is dropped.
pub async fn set_test_mode(state: &AppState, enabled: bool) -> Result<Settings, TrackerError> {
    let settings = update_settings(
        state,
        UpdateSettingsInput {
            test_mode: Some(enabled),
            ..Default::default()
        },
    )
    .await?;

    log::info!("Test mode {}", if enabled { "enabled" } else { "disabled" });

    {
        let mut tracker = state.tracker.lock().await;
        tracker.source = None;
        tracker.store.replace_all(Vec::new());
        tracker.unrealized.clear();
    }

    // Live mode without a session stays unloaded until login.
    match load_trades(state).await {
        Ok(_) | Err(TrackerError::Unauthenticated(_)) => Ok(settings),
        Err(e) => Err(e),
    }
}
