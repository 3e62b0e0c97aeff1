//! Event type definitions for the event bus.

use serde::{Deserialize, Serialize};

/// Notifications consumed by the machine preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PreviewEvent {
    /// A G-code file started loading; any preview of the old file is stale
    FileLoading {
        /// Milliseconds spent so far.
        elapsed_ms: u64,
        /// The file being loaded.
        filename: String,
    },
    /// A G-code file finished loading
    FileLoaded {
        /// Milliseconds spent loading.
        elapsed_ms: u64,
        /// The file that was loaded.
        filename: String,
    },
    /// Application settings were edited and saved
    SettingsChanged,
    /// The colour scheme changed
    ColorSchemeChanged,
}

impl PreviewEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            PreviewEvent::FileLoading { .. } | PreviewEvent::FileLoaded { .. } => {
                EventCategory::File
            }
            PreviewEvent::SettingsChanged => EventCategory::Settings,
            PreviewEvent::ColorSchemeChanged => EventCategory::Appearance,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            PreviewEvent::FileLoading { filename, .. } => format!("Loading {}", filename),
            PreviewEvent::FileLoaded {
                filename,
                elapsed_ms,
            } => format!("Loaded {} in {}ms", filename, elapsed_ms),
            PreviewEvent::SettingsChanged => "Settings changed".to_string(),
            PreviewEvent::ColorSchemeChanged => "Colour scheme changed".to_string(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// G-code file loading events.
    File,
    /// Settings and configuration events.
    Settings,
    /// Colour scheme and theme events.
    Appearance,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::File => write!(f, "File"),
            EventCategory::Settings => write!(f, "Settings"),
            EventCategory::Appearance => write!(f, "Appearance"),
        }
    }
}
