//! Motion-control collaborator interface
//!
//! The preview panel only reads telemetry from the controller and forwards
//! jog requests to it; serial transport and command queueing live behind
//! this trait.

use crate::error::Result;
use crate::position::Position;
use crate::toolpath::ToolpathModel;
use std::sync::Arc;
use tiny_skia::Point;

/// Pointer button that triggered an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left / primary button
    Primary,
    /// Right / secondary button
    Secondary,
    /// Any other button
    Other,
}

/// Telemetry and jog entry point exposed by the machine controller
pub trait MotionController: Send + Sync {
    /// Last reported machine position
    fn machine_position(&self) -> Position;

    /// Last reported work position
    fn work_position(&self) -> Position;

    /// Current feed rate
    fn current_feed(&self) -> f32;

    /// Current spindle speed or laser power
    fn current_spindle(&self) -> f32;

    /// Active working offset (machine minus work)
    fn working_offset(&self) -> Position;

    /// Currently loaded toolpath, if any
    fn loaded_file(&self) -> Option<Arc<dyn ToolpathModel>>;

    /// Start an immediate jog towards `target` (machine XY).
    ///
    /// `alternate` is set when the request came from the secondary button.
    fn begin_jog(&self, target: Point, alternate: bool) -> Result<()>;
}
