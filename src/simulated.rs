//! In-process controller used by the command line renderer and tests.
//!
//! Holds telemetry that callers set directly. Jogs move the tool instantly.

use grblpreview_core::{
    ControllerError, MotionController, Point, Position, Result, ToolpathModel,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A jog accepted by the simulated controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JogRequest {
    pub target: Point,
    pub alternate: bool,
}

#[derive(Debug, Default)]
struct Telemetry {
    machine: Position,
    offset: Position,
    feed: f32,
    spindle: f32,
}

pub struct SimulatedController {
    telemetry: RwLock<Telemetry>,
    file: RwLock<Option<Arc<dyn ToolpathModel>>>,
    jogs: RwLock<Vec<JogRequest>>,
    connected: AtomicBool,
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedController {
    pub fn new() -> Self {
        Self {
            telemetry: RwLock::new(Telemetry::default()),
            file: RwLock::new(None),
            jogs: RwLock::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn description(&self) -> String {
        "Simulated GRBL 1.1h".to_string()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_machine_position(&self, position: Position) {
        self.telemetry.write().machine = position;
    }

    /// Work offset; the work position is the machine position minus it
    pub fn set_working_offset(&self, offset: Position) {
        self.telemetry.write().offset = offset;
    }

    pub fn set_feed(&self, feed: f32) {
        self.telemetry.write().feed = feed;
    }

    pub fn set_spindle(&self, spindle: f32) {
        self.telemetry.write().spindle = spindle;
    }

    pub fn load_file(&self, model: Arc<dyn ToolpathModel>) {
        info!("Simulated controller loaded toolpath ({})", model.quadrant());
        *self.file.write() = Some(model);
    }

    pub fn jogs(&self) -> Vec<JogRequest> {
        self.jogs.read().clone()
    }
}

impl MotionController for SimulatedController {
    fn machine_position(&self) -> Position {
        self.telemetry.read().machine
    }

    fn work_position(&self) -> Position {
        let t = self.telemetry.read();
        t.machine.subtract(&t.offset)
    }

    fn current_feed(&self) -> f32 {
        self.telemetry.read().feed
    }

    fn current_spindle(&self) -> f32 {
        self.telemetry.read().spindle
    }

    fn working_offset(&self) -> Position {
        self.telemetry.read().offset
    }

    fn loaded_file(&self) -> Option<Arc<dyn ToolpathModel>> {
        self.file.read().clone()
    }

    fn begin_jog(&self, target: Point, alternate: bool) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ControllerError::NotConnected.into());
        }
        if !target.x.is_finite() || !target.y.is_finite() {
            return Err(ControllerError::JogRejected {
                reason: format!("invalid target ({}, {})", target.x, target.y),
            }
            .into());
        }

        debug!("Simulated jog to ({:.3}, {:.3})", target.x, target.y);
        {
            let mut t = self.telemetry.write();
            t.machine.x = target.x as f64;
            t.machine.y = target.y as f64;
        }
        self.jogs.write().push(JogRequest { target, alternate });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_position_follows_offset() {
        let controller = SimulatedController::new();
        controller.set_machine_position(Position::new(100.0, 50.0, -1.0));
        controller.set_working_offset(Position::new(90.0, 40.0, 0.0));
        assert_eq!(controller.work_position(), Position::new(10.0, 10.0, -1.0));
    }

    #[test]
    fn test_jog_moves_tool() {
        let controller = SimulatedController::new();
        controller
            .begin_jog(Point::from_xy(12.0, 8.0), true)
            .unwrap();
        assert_eq!(controller.machine_position(), Position::new(12.0, 8.0, 0.0));
        assert_eq!(
            controller.jogs(),
            vec![JogRequest {
                target: Point::from_xy(12.0, 8.0),
                alternate: true
            }]
        );
    }

    #[test]
    fn test_jog_requires_connection() {
        let controller = SimulatedController::new();
        controller.set_connected(false);
        let err = controller
            .begin_jog(Point::from_xy(1.0, 1.0), false)
            .unwrap_err();
        assert!(err.is_controller_error());
        assert!(controller.jogs().is_empty());
    }
}
