//! # GrblPreview Visualizer
//!
//! Machine preview for a GRBL controller: renders the loaded toolpath into an
//! offscreen bitmap on a worker thread, paints the live tool position and
//! status text over it, and maps pointer clicks back to machine coordinates.

pub mod gcode_toolpath;
pub mod overlay;
pub mod panel;
pub mod poller;
pub mod progress;
pub mod renderer;
pub mod text;
pub mod transform;
pub mod viewport;

pub use gcode_toolpath::{GcodeToolpath, PathSegment};
pub use overlay::{
    HorizontalAlign, OverlayPainter, OverlayState, StatusText, TextAnchor, VerticalAlign,
};
pub use panel::MachinePreviewPanel;
pub use poller::{PositionPoller, Telemetry};
pub use progress::{FillStyle, ProgressBar, ProgressError};
pub use renderer::{PreviewRenderer, PreviewSnapshot, RENDER_THREAD_NAME};
pub use text::TextRenderer;
pub use transform::CoordinateTransform;
pub use viewport::Bounds;
