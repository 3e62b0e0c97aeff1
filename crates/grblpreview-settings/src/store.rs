//! Settings Store
//!
//! A flat mapping from string key to typed value, persisted as JSON.
//! Reads never fail: a missing key or a value of a different type yields the
//! caller's default. The store is owned by the application and passed
//! explicitly (usually as `Arc<SettingsStore>`) to whoever needs it.

use crate::error::{SettingsError, SettingsResult};
use grblpreview_core::Position;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name used for the persisted store
pub const SETTINGS_FILE_NAME: &str = "grblpreview.settings.json";

const APP_DIR_NAME: &str = "grblpreview";

/// A stored setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Point(Position),
}

/// Rust types that can be read from and written to the store
pub trait SettingType: Sized {
    /// Extract a value of this type, or `None` on type mismatch
    fn from_setting(value: &SettingValue) -> Option<Self>;

    fn into_setting(self) -> SettingValue;
}

impl SettingType for bool {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn into_setting(self) -> SettingValue {
        SettingValue::Bool(self)
    }
}

impl SettingType for i64 {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn into_setting(self) -> SettingValue {
        SettingValue::Int(self)
    }
}

impl SettingType for f64 {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn into_setting(self) -> SettingValue {
        SettingValue::Float(self)
    }
}

impl SettingType for String {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_setting(self) -> SettingValue {
        SettingValue::Text(self)
    }
}

impl SettingType for Position {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Point(p) => Some(*p),
            _ => None,
        }
    }

    fn into_setting(self) -> SettingValue {
        SettingValue::Point(self)
    }
}

/// Typed key-value settings with optional file backing
#[derive(Debug, Default)]
pub struct SettingsStore {
    values: RwLock<BTreeMap<String, SettingValue>>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that saves to `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            path: Some(path.into()),
        }
    }

    /// Load the store backed by `path`.
    ///
    /// A missing file gives an empty store. A corrupt file is logged and also
    /// gives an empty store, so a bad settings file never blocks start-up.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read_values(&path) {
            Ok(Some(values)) => {
                debug!("Loaded {} settings from {}", values.len(), path.display());
                values
            }
            Ok(None) => {
                debug!("No settings file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            values: RwLock::new(values),
            path: Some(path),
        }
    }

    /// Load the store from the platform data directory.
    ///
    /// If no file exists there yet but one is present in the working
    /// directory, it is copied over first.
    pub fn load_default() -> SettingsResult<Self> {
        let path = Self::default_path()?;
        if !path.exists() && Path::new(SETTINGS_FILE_NAME).exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(SETTINGS_FILE_NAME, &path)?;
            debug!("Migrated {} to {}", SETTINGS_FILE_NAME, path.display());
        }
        Ok(Self::load(path))
    }

    /// Default location of the settings file
    pub fn default_path() -> SettingsResult<PathBuf> {
        let base = dirs::data_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no data directory for this platform".to_string())
        })?;
        Ok(base.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    fn read_values(path: &Path) -> SettingsResult<Option<BTreeMap<String, SettingValue>>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read `key` as `T`, or `default` when missing or of another type
    pub fn get_or<T: SettingType>(&self, key: &str, default: T) -> T {
        self.values
            .read()
            .get(key)
            .and_then(T::from_setting)
            .unwrap_or(default)
    }

    /// Raw value for `key`
    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().get(key).cloned()
    }

    /// Read `key` as `T` (or `default`) and remove it from the store
    pub fn take_or<T: SettingType>(&self, key: &str, default: T) -> T {
        self.values
            .write()
            .remove(key)
            .as_ref()
            .and_then(T::from_setting)
            .unwrap_or(default)
    }

    /// Insert or replace `key`
    pub fn set<T: SettingType>(&self, key: &str, value: T) {
        self.values
            .write()
            .insert(key.to_string(), value.into_setting());
    }

    /// Remove `key`; returns whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.values.write().remove(key).is_some()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Save to the backing file
    pub fn save(&self) -> SettingsResult<()> {
        let path = self.path.as_deref().ok_or(SettingsError::NoBackingFile)?;
        self.save_to(path)
    }

    /// Save a snapshot of the store to `path`
    pub fn save_to(&self, path: &Path) -> SettingsResult<()> {
        let content = serde_json::to_string_pretty(&*self.values.read())?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| SettingsError::SaveError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_returns_default() {
        let store = SettingsStore::new();
        assert!(store.get_or("Click N Jog", true));
        assert_eq!(store.get_or("Jog Speed", 1000_i64), 1000);
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let store = SettingsStore::new();
        store.set("Jog Speed", "fast".to_string());
        assert_eq!(store.get_or("Jog Speed", 1000_i64), 1000);
        assert_eq!(store.get_or("Jog Speed", String::new()), "fast");
    }

    #[test]
    fn test_set_replaces() {
        let store = SettingsStore::new();
        store.set("Enable Z Jog Control", false);
        store.set("Enable Z Jog Control", true);
        assert!(store.get_or("Enable Z Jog Control", false));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_and_exists() {
        let store = SettingsStore::new();
        store.set("Offset", Position::new(1.0, 2.0, 3.0));
        assert!(store.exists("Offset"));
        assert!(store.delete("Offset"));
        assert!(!store.exists("Offset"));
        assert!(!store.delete("Offset"));
    }

    #[test]
    fn test_take_removes_even_on_mismatch() {
        let store = SettingsStore::new();
        store.set("Pending Update", 2.5_f64);
        assert!(!store.take_or("Pending Update", false));
        assert!(!store.exists("Pending Update"));

        store.set("Pending Update", 2.5_f64);
        assert_eq!(store.take_or("Pending Update", 0.0_f64), 2.5);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_without_path_fails() {
        let store = SettingsStore::new();
        assert!(matches!(store.save(), Err(SettingsError::NoBackingFile)));
    }
}
