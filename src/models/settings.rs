use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub id: i32,
    pub test_mode: bool,
    pub refresh_interval_secs: i64,
    pub refresh_batch_size: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub test_mode: Option<bool>,
    pub refresh_interval_secs: Option<i64>,
    pub refresh_batch_size: Option<i64>,
}
