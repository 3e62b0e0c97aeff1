//! # GrblPreview
//!
//! Machine preview for GRBL laser and CNC controllers.
//!
//! ## Architecture
//!
//! GrblPreview is organized as a workspace with multiple crates:
//!
//! 1. **grblpreview-core** - Positions, errors, collaborator traits, colour scheme, notification bus
//! 2. **grblpreview-settings** - Key/value settings store and preview options
//! 3. **grblpreview-visualizer** - Offscreen renderer, overlay painter, position poller, panel
//! 4. **grblpreview** - Binary, crash reporting and a simulated controller

pub mod crash_report;
pub mod simulated;

pub use crash_report::{install_panic_hook, CrashReport};
pub use simulated::SimulatedController;

pub use grblpreview_core::{
    CancelToken, CartesianQuadrant, ColorScheme, ControllerError, Error, EventBus,
    MotionController, PointerButton, Position, PreviewEvent, RenderError, Result, ToolpathModel,
};

pub use grblpreview_settings::{PreviewConfig, SettingsStore};

pub use grblpreview_visualizer::{
    CoordinateTransform, GcodeToolpath, MachinePreviewPanel, OverlayPainter, PositionPoller,
    PreviewRenderer, ProgressBar, StatusText,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
/// - Thread names, so render workers are identifiable
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    // In Windows release builds, log to a file next to the executable
    #[cfg(all(target_os = "windows", not(debug_assertions)))]
    {
        use std::fs::OpenOptions;

        let log_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| std::path::PathBuf::from("."));

        let log_file = log_dir.join("grblpreview.log");

        match OpenOptions::new().create(true).append(true).open(&log_file) {
            Ok(file) => {
                let fmt_layer = fmt::layer()
                    .with_writer(file)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .pretty();

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .try_init()?;
            }
            Err(_) => {
                tracing_subscriber::registry().with(env_filter).try_init()?;
            }
        }
    }

    #[cfg(not(all(target_os = "windows", not(debug_assertions))))]
    {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
