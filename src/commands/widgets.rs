use chrono::Utc;

use crate::error::TrackerError;
use crate::local_storage::WIDGETS_KEY;
use crate::models::{LayoutItem, TRADES_TRACKER_CONTENT, Widget, WidgetSize};
use crate::state::AppState;

const TRADES_TRACKER_TITLE: &str = "Trades Tracker";

fn trades_tracker_widget(id: String) -> Widget {
    Widget {
        id,
        title: TRADES_TRACKER_TITLE.to_string(),
        content_type: Some(TRADES_TRACKER_CONTENT.to_string()),
        content: None,
        size: WidgetSize::Large,
        x: 0,
        y: 0,
    }
}

/// Layout shown when nothing usable is stored.
pub fn default_layout() -> Vec<Widget> {
    vec![trades_tracker_widget("widget1".to_string())]
}

fn save_layout(state: &AppState, widgets: &[Widget]) -> Result<(), TrackerError> {
    let raw = serde_json::to_string(widgets)?;
    state.local_storage.set_item(WIDGETS_KEY, &raw)
}

pub fn list_widgets(state: &AppState) -> Result<Vec<Widget>, TrackerError> {
    let Some(raw) = state.local_storage.get_item(WIDGETS_KEY)? else {
        return Ok(default_layout());
    };

    match serde_json::from_str(&raw) {
        Ok(widgets) => Ok(widgets),
        Err(e) => {
            log::warn!("Stored widget layout is unreadable, using default: {}", e);
            Ok(default_layout())
        }
    }
}

/// Append a new trades-tracker widget at the origin.
pub fn add_widget(state: &AppState) -> Result<Widget, TrackerError> {
    let mut widgets = list_widgets(state)?;
    let mut id = format!("widget-{}", Utc::now().timestamp_millis());
    // Two adds inside the same millisecond
    while widgets.iter().any(|w| w.id == id) {
        id.push('x');
    }

    let widget = trades_tracker_widget(id);
    widgets.push(widget.clone());
    save_layout(state, &widgets)?;

    log::info!("Widget {} added", widget.id);
    Ok(widget)
}

/// Remove a widget. Nothing happens without confirmation.
pub fn remove_widget(state: &AppState, id: &str, confirmed: bool) -> Result<bool, TrackerError> {
    if !confirmed {
        return Ok(false);
    }

    let mut widgets = list_widgets(state)?;
    let before = widgets.len();
    widgets.retain(|w| w.id != id);
    if widgets.len() == before {
        return Err(TrackerError::NotFound(format!("Widget {}", id)));
    }

    save_layout(state, &widgets)?;
    log::info!("Widget {} removed", id);
    Ok(true)
}

/// Apply positions reported by the grid. Unknown ids are ignored.
pub fn apply_layout(state: &AppState, layout: &[LayoutItem]) -> Result<Vec<Widget>, TrackerError> {
    let mut widgets = list_widgets(state)?;
    for widget in widgets.iter_mut() {
        if let Some(item) = layout.iter().find(|item| item.i == widget.id) {
            widget.x = item.x;
            widget.y = item.y;
        }
    }

    save_layout(state, &widgets)?;
    Ok(widgets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::demo_state;

    #[test]
    fn test_default_layout_when_absent_or_corrupt() {
        let (state, _dir) = demo_state();
        assert_eq!(list_widgets(&state).unwrap(), default_layout());

        state.local_storage.set_item(WIDGETS_KEY, "{not json").unwrap();
        let widgets = list_widgets(&state).unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].id, "widget1");
        assert_eq!(widgets[0].size, WidgetSize::Large);
    }

    #[test]
    fn test_add_and_remove() {
        let (state, _dir) = demo_state();

        let added = add_widget(&state).unwrap();
        assert!(added.id.starts_with("widget-"));
        assert_eq!((added.x, added.y), (0, 0));
        assert_eq!(list_widgets(&state).unwrap().len(), 2);

        assert!(!remove_widget(&state, &added.id, false).unwrap());
        assert_eq!(list_widgets(&state).unwrap().len(), 2);

        assert!(remove_widget(&state, &added.id, true).unwrap());
        assert_eq!(list_widgets(&state).unwrap(), default_layout());
        assert!(matches!(
            remove_widget(&state, "nope", true),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_apply_layout_persists_positions() {
        let (state, _dir) = demo_state();

        apply_layout(
            &state,
            &[
                LayoutItem { i: "widget1".to_string(), x: 2, y: 1 },
                LayoutItem { i: "ghost".to_string(), x: 9, y: 9 },
            ],
        )
        .unwrap();

        let widgets = list_widgets(&state).unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!((widgets[0].x, widgets[0].y), (2, 1));
    }

    #[test]
    fn test_stored_layout_uses_camel_case() {
        let (state, _dir) = demo_state();
        add_widget(&state).unwrap();

        let raw = state.local_storage.get_item(WIDGETS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"contentType\":\"trades-tracker\""));
    }
}
