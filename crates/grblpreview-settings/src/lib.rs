//! GrblPreview Settings Crate
//!
//! Handles the typed key-value settings store, its persistence, and the
//! explicit configuration object the preview panel reads from it.

pub mod config;
pub mod error;
pub mod store;

pub use config::{color_scheme, PreviewConfig, CLICK_AND_JOG_KEY, COLOR_SCHEME_KEY, FORCE_Z_KEY};
pub use error::{SettingsError, SettingsResult};
pub use store::{SettingType, SettingValue, SettingsStore, SETTINGS_FILE_NAME};
