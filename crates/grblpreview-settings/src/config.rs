//! Preview configuration
//!
//! The preview panel recognises a fixed set of options. They are read from
//! the settings store once at construction and again whenever the
//! application announces a settings change; they can also be kept in a
//! standalone `.json` or `.toml` file.

use crate::error::{SettingsError, SettingsResult};
use crate::store::SettingsStore;
use grblpreview_core::ColorScheme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Store key: always show the Z axis in the status text
pub const FORCE_Z_KEY: &str = "Enable Z Jog Control";
/// Store key: double-click on the preview jogs to the clicked point
pub const CLICK_AND_JOG_KEY: &str = "Click N Jog";
/// Store key: name of the built-in colour scheme
pub const COLOR_SCHEME_KEY: &str = "Color Schema";

/// Options recognised by the machine preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Show Z in the status text even when both Z values are zero
    #[serde(default)]
    pub force_z_jog_control: bool,
    /// Enable click-to-jog on the preview
    #[serde(default = "default_click_and_jog")]
    pub click_and_jog: bool,
}

fn default_click_and_jog() -> bool {
    true
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            force_z_jog_control: false,
            click_and_jog: default_click_and_jog(),
        }
    }
}

impl PreviewConfig {
    /// Read the options from `store`, falling back to defaults per key
    pub fn from_store(store: &SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            force_z_jog_control: store.get_or(FORCE_Z_KEY, defaults.force_z_jog_control),
            click_and_jog: store.get_or(CLICK_AND_JOG_KEY, defaults.click_and_jog),
        }
    }

    /// Write the options into `store`
    pub fn write_to(&self, store: &SettingsStore) {
        store.set(FORCE_Z_KEY, self.force_z_jog_control);
        store.set(CLICK_AND_JOG_KEY, self.click_and_jog);
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        match extension(path) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        std::fs::write(path, content).map_err(|e| SettingsError::SaveError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Colour scheme selected in `store`; unknown names fall back to the default
pub fn color_scheme(store: &SettingsStore) -> ColorScheme {
    let name: String = store.get_or(COLOR_SCHEME_KEY, String::new());
    ColorScheme::named(&name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_store() {
        let config = PreviewConfig::from_store(&SettingsStore::new());
        assert!(!config.force_z_jog_control);
        assert!(config.click_and_jog);
    }

    #[test]
    fn test_from_store_reads_keys() {
        let store = SettingsStore::new();
        store.set(FORCE_Z_KEY, true);
        store.set(CLICK_AND_JOG_KEY, false);

        let config = PreviewConfig::from_store(&store);
        assert!(config.force_z_jog_control);
        assert!(!config.click_and_jog);
    }

    #[test]
    fn test_wrong_type_in_store_uses_default() {
        let store = SettingsStore::new();
        store.set(CLICK_AND_JOG_KEY, 0_i64);
        assert!(PreviewConfig::from_store(&store).click_and_jog);
    }

    #[test]
    fn test_color_scheme_lookup() {
        let store = SettingsStore::new();
        assert_eq!(color_scheme(&store), ColorScheme::default());

        store.set(COLOR_SCHEME_KEY, "Light".to_string());
        assert_eq!(color_scheme(&store), ColorScheme::light());

        store.set(COLOR_SCHEME_KEY, "Neon".to_string());
        assert_eq!(color_scheme(&store), ColorScheme::default());
    }

    #[test]
    fn test_partial_toml_uses_field_defaults() {
        let config: PreviewConfig = toml::from_str("force_z_jog_control = true").unwrap();
        assert!(config.force_z_jog_control);
        assert!(config.click_and_jog);
    }
}
