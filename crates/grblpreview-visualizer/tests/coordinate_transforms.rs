//! Tests for machine <-> drawing coordinate conversion

use grblpreview_core::{ColorScheme, Point};
use grblpreview_visualizer::{Bounds, CoordinateTransform, GcodeToolpath, PreviewRenderer};
use proptest::prelude::*;
use std::sync::Arc;
use tiny_skia::Transform;

fn close(a: Point, b: Point, tolerance: f32) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
}

#[test]
fn test_rendered_transform_maps_path_inside_panel() {
    let gcode = "G0 X10 Y10\nG1 X20 Y10\nG1 X20 Y20\nG1 X10 Y20\nG1 X10 Y10";
    let renderer = PreviewRenderer::default();
    renderer.request(
        400,
        300,
        Some(Arc::new(GcodeToolpath::parse(gcode))),
        ColorScheme::default(),
    );
    renderer.wait_idle();

    let transform = renderer.transform();
    assert!(transform.is_invertible());

    for (x, y) in [(0.0, 0.0), (10.0, 10.0), (20.0, 20.0)] {
        let p = transform.machine_to_draw(Point::from_xy(x, y));
        assert!((0.0..=400.0).contains(&p.x), "x {} outside panel", p.x);
        assert!((0.0..=300.0).contains(&p.y), "y {} outside panel", p.y);
    }

    // +Y is up on screen
    let low = transform.machine_to_draw(Point::from_xy(10.0, 10.0));
    let high = transform.machine_to_draw(Point::from_xy(10.0, 20.0));
    assert!(high.y < low.y);
}

#[test]
fn test_click_maps_back_to_machine() {
    let mut bounds = Bounds::new();
    bounds.update(0.0, 0.0);
    bounds.update(200.0, 100.0);
    let transform = CoordinateTransform::new(bounds.fit_transform(400.0, 300.0, 20.0));

    let centre = transform.draw_to_machine(Point::from_xy(200.0, 150.0));
    assert!(close(centre, Point::from_xy(100.0, 50.0), 1e-3));
}

#[test]
fn test_before_first_render_is_identity() {
    let renderer = PreviewRenderer::default();
    let transform = renderer.transform();
    let p = Point::from_xy(123.0, 45.0);
    assert_eq!(transform.machine_to_draw(p), p);
    assert_eq!(transform.draw_to_machine(p), p);
}

fn invertible_transform() -> impl Strategy<Value = Transform> {
    (
        prop_oneof![0.05f32..50.0, -50.0f32..-0.05],
        prop_oneof![0.05f32..50.0, -50.0f32..-0.05],
        -500.0f32..500.0,
        -500.0f32..500.0,
    )
        .prop_map(|(sx, sy, tx, ty)| Transform::from_row(sx, 0.0, 0.0, sy, tx, ty))
}

proptest! {
    #[test]
    fn prop_inverse_undoes_forward(
        matrix in invertible_transform(),
        x in -1000.0f32..1000.0,
        y in -1000.0f32..1000.0,
    ) {
        let transform = CoordinateTransform::new(matrix);
        let p = Point::from_xy(x, y);
        let back = transform.draw_to_machine(transform.machine_to_draw(p));

        let tolerance = 1e-3 * (1.0 + x.abs().max(y.abs()));
        prop_assert!(close(back, p, tolerance), "{:?} -> {:?}", p, back);
    }

    #[test]
    fn prop_singular_inverse_is_identity(
        sy in -10.0f32..10.0,
        tx in -100.0f32..100.0,
        x in -1000.0f32..1000.0,
        y in -1000.0f32..1000.0,
    ) {
        let transform = CoordinateTransform::new(Transform::from_row(0.0, 0.0, 0.0, sy, tx, 0.0));
        let p = Point::from_xy(x, y);
        prop_assert_eq!(transform.draw_to_machine(p), p);
    }
}
