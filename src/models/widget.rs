use serde::{Deserialize, Serialize};

pub const TRADES_TRACKER_CONTENT: &str = "trades-tracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetSize {
    Small,
    Wide,
    Tall,
    Large,
}

impl WidgetSize {
    /// Grid span as (w, h).
    pub fn span(&self) -> (u32, u32) {
        match self {
            WidgetSize::Small => (1, 1),
            WidgetSize::Wide => (2, 1),
            WidgetSize::Tall => (1, 2),
            WidgetSize::Large => (2, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub size: WidgetSize,
    pub x: u32,
    pub y: u32,
}

/// Position reported by the grid after a drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub i: String,
    pub x: u32,
    pub y: u32,
}
