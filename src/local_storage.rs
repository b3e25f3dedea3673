use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TrackerError;

const STORAGE_FILE: &str = "local_storage.json";

pub const WIDGETS_KEY: &str = "widgets";
pub const SESSION_KEY: &str = "__session";

/// String key/value store persisted as one JSON object.
///
/// Holds UI state only (grid layout, session marker), never trades.
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STORAGE_FILE),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, TrackerError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.load()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), TrackerError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
