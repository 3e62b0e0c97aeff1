//! Change detection for controller telemetry.

use grblpreview_core::{MotionController, Position};

/// One sample of the values shown by the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    pub machine: Position,
    pub work: Position,
    pub feed: f32,
    pub speed: f32,
}

impl Telemetry {
    /// Read the current values from `controller`
    pub fn sample(controller: &dyn MotionController) -> Self {
        Self {
            machine: controller.machine_position(),
            work: controller.work_position(),
            feed: controller.current_feed(),
            speed: controller.current_spindle(),
        }
    }

    /// Field-wise equality where NaN matches NaN
    pub fn same_as(&self, other: &Telemetry) -> bool {
        let positions = |a: &Position, b: &Position| {
            same(a.x, b.x) && same(a.y, b.y) && same(a.z, b.z)
        };
        positions(&self.machine, &other.machine)
            && positions(&self.work, &other.work)
            && same(self.feed as f64, other.feed as f64)
            && same(self.speed as f64, other.speed as f64)
    }
}

fn same(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Remembers the last telemetry seen and reports when it changes
#[derive(Debug, Clone, Default)]
pub struct PositionPoller {
    last: Telemetry,
    feed_speed_seen: bool,
}

impl PositionPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `sample`; returns true if any field differs from the last one
    pub fn observe(&mut self, sample: Telemetry) -> bool {
        if sample.same_as(&self.last) {
            return false;
        }
        if sample.feed != 0.0 || sample.speed != 0.0 {
            self.feed_speed_seen = true;
        }
        self.last = sample;
        true
    }

    /// Sample `controller` and record the values
    pub fn tick(&mut self, controller: &dyn MotionController) -> bool {
        self.observe(Telemetry::sample(controller))
    }

    pub fn last(&self) -> Telemetry {
        self.last
    }

    /// Feed or speed has been nonzero in some observed sample
    pub fn feed_speed_seen(&self) -> bool {
        self.feed_speed_seen
    }
}
