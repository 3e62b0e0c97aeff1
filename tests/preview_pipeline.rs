//! Whole-pipeline tests: simulated controller, panel, PNG output, crash reports

use grblpreview::{
    CrashReport, EventBus, GcodeToolpath, MachinePreviewPanel, MotionController, PointerButton,
    Position, PreviewEvent, SettingsStore, SimulatedController,
};
use grblpreview_core::Point;
use std::sync::Arc;
use tempfile::TempDir;
use tiny_skia::Pixmap;

const LASER_JOB: &str = "\
; simple engraving job
G21
G90
G0 X5 Y5
M3 S800
G1 X45 Y5 F1200
G1 X45 Y35
G2 X35 Y45 I-10 J0
G1 X5 Y45
G1 X5 Y5
M5
G0 X0 Y0
";

fn panel_for(controller: Arc<SimulatedController>, bus: Arc<EventBus>) -> MachinePreviewPanel {
    MachinePreviewPanel::new(
        controller,
        Arc::new(SettingsStore::new()),
        bus,
        Arc::new(|| {}),
    )
}

#[test]
fn test_render_job_to_png() {
    let dir = TempDir::new().unwrap();
    let controller = Arc::new(SimulatedController::new());
    let bus = Arc::new(EventBus::new());
    let panel = panel_for(controller.clone(), bus.clone());
    panel.resize(320, 240);

    controller.load_file(Arc::new(GcodeToolpath::parse(LASER_JOB)));
    bus.publish(PreviewEvent::FileLoaded {
        elapsed_ms: 3,
        filename: "job.nc".to_string(),
    })
    .unwrap();
    controller.set_machine_position(Position::new(45.0, 35.0, 0.0));
    controller.set_feed(1200.0);
    controller.set_spindle(800.0);
    assert!(panel.timer_update());
    panel.wait_for_render();

    let mut frame = Pixmap::new(320, 240).unwrap();
    let status = panel.paint(&mut frame);
    assert_eq!(
        status.to_string(),
        "X: 45.000 Y: 35.000\nF: 01200 S: 800"
    );

    let path = dir.path().join("preview.png");
    frame.save_png(&path).unwrap();
    let loaded = Pixmap::load_png(&path).unwrap();
    assert_eq!((loaded.width(), loaded.height()), (320, 240));
}

#[test]
fn test_click_and_jog_moves_simulated_tool() {
    let controller = Arc::new(SimulatedController::new());
    let bus = Arc::new(EventBus::new());
    let panel = panel_for(controller.clone(), bus.clone());
    panel.resize(300, 300);

    controller.load_file(Arc::new(GcodeToolpath::parse(LASER_JOB)));
    bus.publish(PreviewEvent::FileLoaded {
        elapsed_ms: 1,
        filename: "job.nc".to_string(),
    })
    .unwrap();
    panel.wait_for_render();

    let click = panel.machine_to_draw(Point::from_xy(25.0, 25.0));
    assert!(panel
        .double_click(click.x, click.y, PointerButton::Primary)
        .unwrap());

    let machine = controller.machine_position();
    assert!((machine.x - 25.0).abs() < 1e-2);
    assert!((machine.y - 25.0).abs() < 1e-2);
    assert!(panel.timer_update());
}

#[test]
fn test_crash_report_saved_as_json() {
    let dir = TempDir::new().unwrap();
    let err = anyhow::anyhow!("bitmap allocation failed").context("rendering job.nc");
    let report = CrashReport::from_anyhow(&err).with_controller("Simulated GRBL 1.1h");

    let path = report.save_to_dir(&dir.path().join("crashes")).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let loaded: CrashReport = serde_json::from_str(&text).unwrap();

    assert_eq!(loaded.errors.len(), 2);
    assert_eq!(loaded.controller.as_deref(), Some("Simulated GRBL 1.1h"));
    assert_eq!(loaded.errors[0].message, "rendering job.nc");
}
