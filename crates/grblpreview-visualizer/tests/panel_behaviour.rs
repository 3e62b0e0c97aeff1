//! End-to-end behaviour of the machine preview panel

use grblpreview_core::{
    ControllerError, EventBus, MotionController, Point, PointerButton, Position, PreviewEvent,
    Result, ToolpathModel,
};
use grblpreview_settings::{SettingsStore, CLICK_AND_JOG_KEY, COLOR_SCHEME_KEY, FORCE_Z_KEY};
use grblpreview_visualizer::{
    GcodeToolpath, HorizontalAlign, MachinePreviewPanel, TextAnchor, VerticalAlign,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tiny_skia::Pixmap;

#[derive(Default)]
struct FakeController {
    machine: Mutex<Position>,
    work: Mutex<Position>,
    feed: Mutex<f32>,
    speed: Mutex<f32>,
    offset: Mutex<Position>,
    file: Mutex<Option<Arc<dyn ToolpathModel>>>,
    jogs: Mutex<Vec<(Point, bool)>>,
    reject_jogs: bool,
}

impl MotionController for FakeController {
    fn machine_position(&self) -> Position {
        *self.machine.lock()
    }

    fn work_position(&self) -> Position {
        *self.work.lock()
    }

    fn current_feed(&self) -> f32 {
        *self.feed.lock()
    }

    fn current_spindle(&self) -> f32 {
        *self.speed.lock()
    }

    fn working_offset(&self) -> Position {
        *self.offset.lock()
    }

    fn loaded_file(&self) -> Option<Arc<dyn ToolpathModel>> {
        self.file.lock().clone()
    }

    fn begin_jog(&self, target: Point, alternate: bool) -> Result<()> {
        if self.reject_jogs {
            return Err(ControllerError::JogRejected {
                reason: "machine is running".to_string(),
            }
            .into());
        }
        self.jogs.lock().push((target, alternate));
        Ok(())
    }
}

struct Fixture {
    controller: Arc<FakeController>,
    settings: Arc<SettingsStore>,
    bus: Arc<EventBus>,
    repaints: Arc<AtomicUsize>,
    panel: MachinePreviewPanel,
}

impl Fixture {
    fn new() -> Self {
        Self::with(FakeController::default(), SettingsStore::new())
    }

    fn with(controller: FakeController, settings: SettingsStore) -> Self {
        let controller = Arc::new(controller);
        let settings = Arc::new(settings);
        let bus = Arc::new(EventBus::new());
        let repaints = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&repaints);
        let panel = MachinePreviewPanel::new(
            controller.clone(),
            settings.clone(),
            bus.clone(),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        Self {
            controller,
            settings,
            bus,
            repaints,
            panel,
        }
    }

    fn load(&self, gcode: &str) {
        *self.controller.file.lock() = Some(Arc::new(GcodeToolpath::parse(gcode)));
        self.bus
            .publish(PreviewEvent::FileLoaded {
                elapsed_ms: 5,
                filename: "part.nc".to_string(),
            })
            .unwrap();
        self.panel.wait_for_render();
    }

    fn repaints(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }
}

const QUADRANT_II: &str = "G0 X-10 Y10\nG1 X-40 Y10\nG1 X-40 Y30\nG1 X-10 Y30\nG1 X-10 Y10\n";

#[test]
fn test_timer_update_repaints_exactly_once_per_change() {
    let f = Fixture::new();
    assert!(!f.panel.timer_update());
    assert_eq!(f.repaints(), 0);

    *f.controller.machine.lock() = Position::new(1.0, 2.0, 0.0);
    assert!(f.panel.timer_update());
    assert!(!f.panel.timer_update());
    assert_eq!(f.repaints(), 1);

    *f.controller.speed.lock() = 300.0;
    assert!(f.panel.timer_update());
    assert_eq!(f.repaints(), 2);
}

#[test]
fn test_status_text_z_rules() {
    let f = Fixture::new();
    *f.controller.machine.lock() = Position::new(5.0, 6.0, 0.0);
    f.panel.timer_update();
    assert!(!f.panel.status_text().shows_z());

    *f.controller.work.lock() = Position::new(5.0, 6.0, -0.5);
    f.panel.timer_update();
    assert!(f.panel.status_text().shows_z());

    *f.controller.work.lock() = Position::new(5.0, 6.0, 0.0);
    f.panel.timer_update();
    assert!(!f.panel.status_text().shows_z());

    f.settings.set(FORCE_Z_KEY, true);
    f.bus.publish(PreviewEvent::SettingsChanged).unwrap();
    assert!(f.panel.status_text().shows_z());
}

#[test]
fn test_settings_change_repaints_only_when_force_z_changes() {
    let f = Fixture::new();
    f.bus.publish(PreviewEvent::SettingsChanged).unwrap();
    assert_eq!(f.repaints(), 0);

    f.settings.set(FORCE_Z_KEY, true);
    f.bus.publish(PreviewEvent::SettingsChanged).unwrap();
    assert_eq!(f.repaints(), 1);
    assert!(f.panel.config().force_z_jog_control);

    f.settings.set(CLICK_AND_JOG_KEY, false);
    f.bus.publish(PreviewEvent::SettingsChanged).unwrap();
    assert_eq!(f.repaints(), 1);
    assert!(!f.panel.config().click_and_jog);
}

#[test]
fn test_feed_speed_line_is_sticky() {
    let f = Fixture::new();
    assert!(!f.panel.status_text().shows_feed_speed());

    *f.controller.feed.lock() = 1500.0;
    f.panel.timer_update();
    assert_eq!(f.panel.status_text().lines()[1], "F: 01500 S: 000");

    *f.controller.feed.lock() = 0.0;
    f.panel.timer_update();
    assert!(f.panel.status_text().shows_feed_speed());
}

#[test]
fn test_work_line_needs_working_offset() {
    let f = Fixture::new();
    *f.controller.work.lock() = Position::new(1.0, 1.0, 0.0);
    f.panel.timer_update();
    assert_eq!(f.panel.status_text().lines().len(), 1);

    *f.controller.offset.lock() = Position::new(10.0, 10.0, 0.0);
    assert_eq!(f.panel.status_text().lines()[1], "X: 1.000 Y: 1.000");
}

#[test]
fn test_quadrant_two_panel_anchors_top_left() {
    let f = Fixture::new();
    f.panel.resize(400, 300);
    f.load(QUADRANT_II);

    let state = f.panel.overlay_state();
    let anchor = TextAnchor::for_quadrant(state.quadrant);
    assert_eq!(anchor.horizontal, HorizontalAlign::Near);
    assert_eq!(anchor.vertical, VerticalAlign::Near);

    let snapshot = f.panel.snapshot().unwrap();
    assert_eq!((snapshot.width(), snapshot.height()), (400, 300));
}

#[test]
fn test_file_loading_keeps_old_preview_until_loaded() {
    let f = Fixture::new();
    f.panel.resize(200, 100);
    f.load(QUADRANT_II);
    let first = f.panel.snapshot().unwrap().generation();

    f.bus
        .publish(PreviewEvent::FileLoading {
            elapsed_ms: 0,
            filename: "next.nc".to_string(),
        })
        .unwrap();
    assert_eq!(f.panel.snapshot().unwrap().generation(), first);

    f.load("G1 X5 Y5\n");
    assert!(f.panel.snapshot().unwrap().generation() > first);
}

#[test]
fn test_double_click_jogs_to_machine_point() {
    let f = Fixture::new();
    f.panel.resize(400, 300);
    f.load(QUADRANT_II);

    let corner = f.panel.machine_to_draw(Point::from_xy(-40.0, 30.0));
    assert!(f
        .panel
        .double_click(corner.x, corner.y, PointerButton::Secondary)
        .unwrap());

    let jogs = f.controller.jogs.lock();
    assert_eq!(jogs.len(), 1);
    let (target, alternate) = jogs[0];
    assert!((target.x + 40.0).abs() < 1e-2);
    assert!((target.y - 30.0).abs() < 1e-2);
    assert!(alternate);
}

#[test]
fn test_double_click_disabled_by_setting() {
    let settings = SettingsStore::new();
    settings.set(CLICK_AND_JOG_KEY, false);
    let f = Fixture::with(FakeController::default(), settings);

    assert!(!f.panel.double_click(10.0, 10.0, PointerButton::Primary).unwrap());
    assert!(f.controller.jogs.lock().is_empty());
}

#[test]
fn test_double_click_before_render_uses_identity() {
    let f = Fixture::new();
    assert!(f.panel.double_click(12.0, 34.0, PointerButton::Primary).unwrap());
    let (target, alternate) = f.controller.jogs.lock()[0];
    assert_eq!(target, Point::from_xy(12.0, 34.0));
    assert!(!alternate);
}

#[test]
fn test_rejected_jog_is_reported() {
    let controller = FakeController {
        reject_jogs: true,
        ..Default::default()
    };
    let f = Fixture::with(controller, SettingsStore::new());
    let err = f
        .panel
        .double_click(1.0, 1.0, PointerButton::Primary)
        .unwrap_err();
    assert!(err.is_controller_error());
}

#[test]
fn test_color_scheme_change_rerenders() {
    let f = Fixture::new();
    f.panel.resize(50, 50);
    f.panel.wait_for_render();
    let before = f.panel.snapshot().unwrap().generation();

    f.settings.set(COLOR_SCHEME_KEY, "light".to_string());
    f.bus.publish(PreviewEvent::ColorSchemeChanged).unwrap();
    f.panel.wait_for_render();

    assert_eq!(f.panel.color_scheme(), grblpreview_core::ColorScheme::light());
    assert!(f.panel.snapshot().unwrap().generation() > before);
}

#[test]
fn test_paint_returns_status_and_fills_frame() {
    let f = Fixture::new();
    f.panel.resize(120, 90);
    f.load(QUADRANT_II);
    *f.controller.machine.lock() = Position::new(-20.0, 15.0, 0.0);
    f.panel.timer_update();

    let mut frame = Pixmap::new(120, 90).unwrap();
    let status = f.panel.paint(&mut frame);
    assert_eq!(status.lines()[0], "X: -20.000 Y: 15.000");
    assert!(frame.pixels().iter().all(|p| p.alpha() == 255));
}

#[test]
fn test_drop_unsubscribes_from_bus() {
    let f = Fixture::new();
    assert_eq!(f.bus.subscriber_count(), 1);
    let bus = f.bus.clone();
    drop(f);
    assert_eq!(bus.subscriber_count(), 0);
}
